use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder the directory export lists for a group without human members.
pub const NO_MEMBERS: &str = "<No members>";

/// True when `members` is exactly the `<No members>` placeholder list.
pub fn is_placeholder(members: &[String]) -> bool {
    matches!(members, [only] if only == NO_MEMBERS)
}

/// Mapping from AD group name to its members, in first-appearance order.
///
/// Groups are registered with [`GroupMembership::insert_if_absent`] before
/// members are pushed, so every known group is a key even while its member
/// list is still empty. Iteration and serialization follow registration
/// order, which is the row order of the source export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupMembership(IndexMap<String, Vec<String>>);

impl GroupMembership {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `group` with an empty member list unless it is already known.
    ///
    /// Returns the group's member list either way.
    pub fn insert_if_absent(&mut self, group: &str) -> &mut Vec<String> {
        self.0.entry(group.to_string()).or_default()
    }

    /// Append `user` to a registered group. Returns `false` for an unknown group.
    pub fn push_member(&mut self, group: &str, user: impl Into<String>) -> bool {
        match self.0.get_mut(group) {
            Some(members) => {
                members.push(user.into());
                true
            }
            None => false,
        }
    }

    /// Members of `group`, if it is registered.
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.0.get(group).map(Vec::as_slice)
    }

    /// Whether `group` is registered.
    pub fn contains_group(&self, group: &str) -> bool {
        self.0.contains_key(group)
    }

    /// `(group, members)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(group, members)| (group.as_str(), members.as_slice()))
    }

    /// Group names in registration order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no group is registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<G, M> FromIterator<(G, M)> for GroupMembership
where
    G: AsRef<str>,
    M: IntoIterator,
    M::Item: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (G, M)>>(iter: I) -> Self {
        let mut membership = Self::new();
        for (group, members) in iter {
            membership
                .insert_if_absent(group.as_ref())
                .extend(members.into_iter().map(Into::into));
        }
        membership
    }
}
