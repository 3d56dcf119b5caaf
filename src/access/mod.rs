/// Resolves, per table, the users whose groups are granted edit access.
pub mod editors;
/// Cross-indexes of users, groups, roles, and tables for inspection views.
pub mod index;
/// Groups catalog rows into a sorted role → tables mapping.
pub mod role_tables;
