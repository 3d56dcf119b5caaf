use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::access::role_tables::RoleTables;
use crate::membership::group_membership::{is_placeholder, GroupMembership};

/// Domain qualifier a database role carries in front of its AD group name.
pub const ROLE_DOMAIN_PREFIX: &str = r"HRM\";

/// Database role expected for an AD group: `HRM\<group>`, exact and case-sensitive.
pub fn role_for_group(group: &str) -> String {
    format!("{ROLE_DOMAIN_PREFIX}{group}")
}

/// AD group a role mirrors, or `None` when the role is not domain-qualified.
pub fn group_for_role(role: &str) -> Option<&str> {
    role.strip_prefix(ROLE_DOMAIN_PREFIX)
}

/// Mapping from table to the users able to edit it.
///
/// Keys are the table universe of the [`RoleTables`] the mapping was resolved
/// from, ascending. A user appears once per qualifying group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableEditors(BTreeMap<String, Vec<String>>);

impl TableEditors {
    /// Editors of `table`.
    pub fn get(&self, table: &str) -> Option<&[String]> {
        self.0.get(table).map(Vec::as_slice)
    }

    /// `(table, editors)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(table, editors)| (table.as_str(), editors.as_slice()))
    }

    /// Table names in ascending order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no table was granted to any role.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve, for every granted table, the members of each group whose
/// bridged role holds the grant.
///
/// Groups contribute in membership order and their members are appended
/// as-is, so a user in two qualifying groups is listed twice. A group whose
/// member list is exactly `["<No members>"]` contributes nothing. Tables no
/// group reaches map to an empty list.
#[tracing::instrument(skip_all)]
pub fn resolve_editors(role_tables: &RoleTables, membership: &GroupMembership) -> TableEditors {
    let mut granting: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (role, tables) in role_tables.iter() {
        for table in tables {
            granting.entry(table.as_str()).or_default().insert(role);
        }
    }

    let bridged: Vec<(String, &[String])> = membership
        .iter()
        .map(|(group, members)| (role_for_group(group), members))
        .collect();

    let mut editors = BTreeMap::new();
    for (table, roles) in granting {
        let mut names = Vec::new();
        for (role, members) in &bridged {
            if roles.contains(role.as_str()) && !is_placeholder(members) {
                names.extend(members.iter().cloned());
            }
        }
        if names.is_empty() {
            debug!("No editors resolved for {table}");
        }
        editors.insert(table.to_string(), names);
    }

    TableEditors(editors)
}

/// Roles holding grants that no membership group bridges to.
///
/// Every table such a role grants silently loses that role's editors, which
/// is how naming drift between the directory and the catalog shows up.
#[tracing::instrument(skip_all)]
pub fn unbridged_roles<'a>(
    role_tables: &'a RoleTables,
    membership: &GroupMembership,
) -> Vec<&'a str> {
    let unbridged: Vec<&str> = role_tables
        .roles()
        .filter(|role| {
            !group_for_role(role).is_some_and(|group| membership.contains_group(group))
        })
        .collect();
    for role in &unbridged {
        warn!("Role {role} matches no group in the membership export");
    }
    unbridged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::role_tables::aggregate;
    use crate::catalog::query::RolePermissionRow;
    use crate::membership::group_membership::NO_MEMBERS;

    fn role_tables(grants: &[(&str, &str)]) -> RoleTables {
        aggregate(
            grants
                .iter()
                .map(|(role, table)| RolePermissionRow::new(*role, *table)),
        )
    }

    #[test]
    fn bridge_is_an_exact_backslash_prefix() {
        assert_eq!(role_for_group("GIS_PARKS"), r"HRM\GIS_PARKS");
        assert_eq!(group_for_role(r"HRM\GIS_PARKS"), Some("GIS_PARKS"));
        assert_eq!(group_for_role("HRM_GIS_PARKS"), None);
        assert_eq!(group_for_role(r"hrm\GIS_PARKS"), None);
    }

    #[test]
    fn members_of_bridged_groups_become_editors() {
        let tables = role_tables(&[(r"HRM\GroupA", "Tbl1")]);
        let membership: GroupMembership =
            [("GroupA", vec!["alice", "bob"])].into_iter().collect();

        let editors = resolve_editors(&tables, &membership);

        assert_eq!(editors.len(), 1);
        assert_eq!(
            editors.get("Tbl1"),
            Some(&["alice".to_string(), "bob".to_string()][..])
        );
    }

    #[test]
    fn placeholder_groups_contribute_nothing() {
        let tables = role_tables(&[(r"HRM\GroupB", "Tbl3")]);
        let membership: GroupMembership = [("GroupB", vec![NO_MEMBERS])].into_iter().collect();

        let editors = resolve_editors(&tables, &membership);

        assert_eq!(editors.get("Tbl3"), Some(&[][..]));
    }

    #[test]
    fn duplicates_across_groups_are_kept_in_membership_order() {
        let tables = role_tables(&[(r"HRM\Zeta", "ROADS"), (r"HRM\Alpha", "ROADS")]);
        let membership: GroupMembership = [
            ("Zeta", vec!["carol", "alice"]),
            ("Alpha", vec!["alice"]),
        ]
        .into_iter()
        .collect();

        let editors = resolve_editors(&tables, &membership);

        assert_eq!(
            editors.get("ROADS"),
            Some(&["carol".to_string(), "alice".to_string(), "alice".to_string()][..])
        );
    }

    #[test]
    fn near_miss_role_names_do_not_bridge() {
        let tables = role_tables(&[
            ("HRM_GroupA", "Tbl1"),
            (r"HRM\groupa", "Tbl2"),
            (r"HRM\GroupA", "Tbl3"),
        ]);
        let membership: GroupMembership = [("GroupA", vec!["alice"])].into_iter().collect();

        let editors = resolve_editors(&tables, &membership);

        assert_eq!(editors.tables().collect::<Vec<_>>(), ["Tbl1", "Tbl2", "Tbl3"]);
        assert_eq!(editors.get("Tbl1"), Some(&[][..]));
        assert_eq!(editors.get("Tbl2"), Some(&[][..]));
        assert_eq!(editors.get("Tbl3"), Some(&["alice".to_string()][..]));
        assert_eq!(
            unbridged_roles(&tables, &membership),
            [r"HRM\groupa", "HRM_GroupA"]
        );
    }
}
