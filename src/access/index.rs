//! Cross-indexes over a membership export and a role → tables mapping.
//!
//! Answers the three questions an auditor asks after a run: who can edit
//! these tables, what can these users edit, and what do these groups hold.
//! Unknown names in a selection contribute nothing rather than failing.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::access::editors::{group_for_role, role_for_group};
use crate::access::role_tables::RoleTables;
use crate::membership::group_membership::{GroupMembership, NO_MEMBERS};

/// A user able to edit a table, with the groups granting that access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableUser {
    /// Member display name.
    pub name: String,
    /// Granting AD groups, sorted.
    pub groups: Vec<String>,
}

/// A table reachable by a user, with the groups granting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTable {
    /// Table name.
    pub table: String,
    /// Granting AD groups, sorted.
    pub groups: Vec<String>,
}

/// Who can edit a selection of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableView {
    /// Groups granting any selected table, sorted.
    pub groups: Vec<String>,
    /// Editors across the selection, merged by name and sorted.
    pub users: Vec<TableUser>,
}

/// What a selection of users can edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserView {
    /// Groups the selected users belong to, sorted.
    pub groups: Vec<String>,
    /// Tables reachable through those groups, sorted by table.
    pub tables: Vec<UserTable>,
}

/// Members and tables of a selection of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupView {
    /// Unique members, sorted, without the `<No members>` placeholder.
    pub members: Vec<String>,
    /// Unique tables granted to the groups' roles, sorted.
    pub tables: Vec<String>,
}

/// Inverted indexes built once from a membership export and a role mapping.
#[derive(Debug, Clone)]
pub struct AccessIndex {
    membership: GroupMembership,
    role_tables: RoleTables,
    user_groups: BTreeMap<String, Vec<String>>,
    table_roles: BTreeMap<String, Vec<String>>,
    table_users: BTreeMap<String, Vec<TableUser>>,
}

impl AccessIndex {
    /// Index `membership` against `role_tables`.
    pub fn build(membership: &GroupMembership, role_tables: &RoleTables) -> Self {
        let mut user_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (group, members) in membership.iter() {
            for member in members.iter().filter(|m| *m != NO_MEMBERS) {
                let groups = user_groups.entry(member.clone()).or_default();
                if !groups.iter().any(|g| g == group) {
                    groups.push(group.to_string());
                }
            }
        }

        let mut table_roles: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (role, tables) in role_tables.iter() {
            for table in tables {
                let roles = table_roles.entry(table.clone()).or_default();
                if !roles.iter().any(|r| r == role) {
                    roles.push(role.to_string());
                }
            }
        }

        let table_users = table_roles
            .iter()
            .map(|(table, roles)| {
                let mut grants: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
                for group in roles.iter().filter_map(|role| group_for_role(role)) {
                    for member in membership.get(group).unwrap_or_default() {
                        if member != NO_MEMBERS {
                            grants.entry(member).or_default().insert(group);
                        }
                    }
                }
                let users = grants
                    .into_iter()
                    .map(|(name, groups)| TableUser {
                        name: name.to_string(),
                        groups: groups.into_iter().map(str::to_string).collect(),
                    })
                    .collect();
                (table.clone(), users)
            })
            .collect();

        Self {
            membership: membership.clone(),
            role_tables: role_tables.clone(),
            user_groups,
            table_roles,
            table_users,
        }
    }

    /// Every granted table, sorted.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.table_roles.keys().map(String::as_str)
    }

    /// Every member with at least one group, sorted.
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.user_groups.keys().map(String::as_str)
    }

    /// Sorted union of membership groups and the groups named by roles.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: BTreeSet<&str> = self.membership.groups().collect();
        groups.extend(self.role_tables.roles().map(short_group_name));
        groups.into_iter().map(str::to_string).collect()
    }

    /// Editors of `table` with their granting groups, sorted by name.
    pub fn table_users(&self, table: &str) -> &[TableUser] {
        self.table_users
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Groups `user` belongs to, in membership order.
    pub fn user_groups(&self, user: &str) -> &[String] {
        self.user_groups
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Tables granted to the role `group` bridges to.
    pub fn group_tables(&self, group: &str) -> &[String] {
        self.role_tables
            .get(&role_for_group(group))
            .unwrap_or_default()
    }

    /// Who can edit `tables`.
    ///
    /// `group_filter` keeps users granted through that group and is ignored
    /// when no selected table is granted to it. `name_filter` keeps users whose
    /// name contains it, case-insensitively.
    pub fn table_view(
        &self,
        tables: &[&str],
        group_filter: Option<&str>,
        name_filter: Option<&str>,
    ) -> TableView {
        let groups: BTreeSet<&str> = tables
            .iter()
            .filter_map(|table| self.table_roles.get(*table))
            .flatten()
            .map(|role| short_group_name(role))
            .collect();
        let group_filter = group_filter.filter(|group| groups.contains(group));

        let mut merged: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for table in tables {
            for user in self.table_users(table) {
                merged
                    .entry(user.name.as_str())
                    .or_default()
                    .extend(user.groups.iter().map(String::as_str));
            }
        }

        let needle = name_filter.map(str::trim).filter(|f| !f.is_empty());
        let users = merged
            .into_iter()
            .filter(|(name, _)| needle.map_or(true, |needle| contains_ignore_case(name, needle)))
            .filter(|(_, granted)| group_filter.map_or(true, |group| granted.contains(group)))
            .map(|(name, granted)| TableUser {
                name: name.to_string(),
                groups: granted.into_iter().map(str::to_string).collect(),
            })
            .collect();

        TableView {
            groups: groups.into_iter().map(str::to_string).collect(),
            users,
        }
    }

    /// What `users` can edit, optionally only through `group_filter`.
    pub fn user_view(&self, users: &[&str], group_filter: Option<&str>) -> UserView {
        let groups: BTreeSet<&str> = users
            .iter()
            .flat_map(|user| self.user_groups(user))
            .map(String::as_str)
            .collect();
        let group_filter = group_filter.filter(|group| groups.contains(group));

        let mut reachable: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for group in &groups {
            for table in self.group_tables(group) {
                reachable.entry(table.as_str()).or_default().insert(group);
            }
        }

        let tables = reachable
            .into_iter()
            .filter(|(_, granted)| group_filter.map_or(true, |group| granted.contains(group)))
            .map(|(table, granted)| UserTable {
                table: table.to_string(),
                groups: granted.into_iter().map(str::to_string).collect(),
            })
            .collect();

        UserView {
            groups: groups.into_iter().map(str::to_string).collect(),
            tables,
        }
    }

    /// Members and tables of `groups`, tables optionally narrowed by name.
    pub fn group_view(&self, groups: &[&str], table_filter: Option<&str>) -> GroupView {
        let members: BTreeSet<&str> = groups
            .iter()
            .filter_map(|group| self.membership.get(group))
            .flatten()
            .map(String::as_str)
            .filter(|member| *member != NO_MEMBERS)
            .collect();

        let needle = table_filter.map(str::trim).filter(|f| !f.is_empty());
        let tables: BTreeSet<&str> = groups
            .iter()
            .flat_map(|group| self.group_tables(group))
            .map(String::as_str)
            .filter(|table| needle.map_or(true, |needle| contains_ignore_case(table, needle)))
            .collect();

        GroupView {
            members: members.into_iter().map(str::to_string).collect(),
            tables: tables.into_iter().map(str::to_string).collect(),
        }
    }
}

fn short_group_name(role: &str) -> &str {
    group_for_role(role).unwrap_or(role)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
