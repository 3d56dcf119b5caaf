/// Table and role naming rules applied to catalog rows, with a T-SQL `LIKE` matcher.
pub mod filters;
/// The fixed permissions query and the rows it yields.
pub mod query;
/// Replays a saved `groups_and_tables.json` in place of a live catalog.
pub mod snapshot;
/// Traits at the boundary between the audit and a permissions catalog.
pub mod source;
/// SQL Server catalog access over TDS.
pub mod sql_server;
