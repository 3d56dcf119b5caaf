use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::query::RolePermissionRow;

/// Mapping from database role to the tables it is granted.
///
/// Roles iterate in ascending order; each table list is sorted ascending and
/// holds no duplicates when built by [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTables(BTreeMap<String, Vec<String>>);

impl RoleTables {
    /// Tables granted to `role`.
    pub fn get(&self, role: &str) -> Option<&[String]> {
        self.0.get(role).map(Vec::as_slice)
    }

    /// `(role, tables)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(role, tables)| (role.as_str(), tables.as_slice()))
    }

    /// Role names in ascending order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no role holds a grant.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted, de-duplicated union of every role's tables.
    pub fn table_universe(&self) -> Vec<&str> {
        self.0
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Roles whose table list contains `table`, in role order.
    pub fn roles_granting<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, tables)| tables.iter().any(|t| t == table))
            .map(|(role, _)| role)
    }

    /// Flatten back into one row per `(role, table)` grant.
    pub fn rows(&self) -> Vec<RolePermissionRow> {
        self.iter()
            .flat_map(|(role, tables)| {
                tables
                    .iter()
                    .map(move |table| RolePermissionRow::new(role, table.as_str()))
            })
            .collect()
    }
}

/// Group catalog rows by role into sorted, duplicate-free table lists.
#[tracing::instrument(skip_all)]
pub fn aggregate(rows: impl IntoIterator<Item = RolePermissionRow>) -> RoleTables {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut row_count = 0usize;
    for row in rows {
        row_count += 1;
        grouped
            .entry(row.role_name)
            .or_default()
            .insert(row.table_name);
    }

    debug!("Aggregated {row_count} grants into {} roles", grouped.len());
    RoleTables(
        grouped
            .into_iter()
            .map(|(role, tables)| (role, tables.into_iter().collect()))
            .collect(),
    )
}
