use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::membership::group_membership::GroupMembership;

/// Header of the column holding the AD group name.
pub const GROUP_COLUMN: &str = "Group Name";
/// Header of the column holding the member's display name.
pub const NAME_COLUMN: &str = "Name";

/// Groups that never grant data access and are dropped from the export.
pub const EXCLUDED_GROUPS: [&str; 4] = [
    "GIS_ATTRIBUTE_RULES_SEQ_ROLE",
    "GIS_HW_ARCGIS_HRMBASIC",
    "GIS_HW_USERS",
    "GIS_REAL_VIEWER",
];

/// Whether rows for `group` are dropped while loading.
pub fn is_excluded_group(group: &str) -> bool {
    EXCLUDED_GROUPS.contains(&group)
}

/// Load the membership export at `path` into a group → members mapping.
///
/// Extra columns are ignored, but every row must have as many fields as the
/// header; a ragged row fails the load as [`Error::MalformedCsv`]. Rows of [`EXCLUDED_GROUPS`] are dropped before
/// any group is registered, so an excluded group never becomes a key.
#[tracing::instrument(skip_all)]
pub fn load_membership(path: &Path) -> Result<GroupMembership> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let mut reader = csv::ReaderBuilder::new().from_reader(file);
    let malformed = |source: csv::Error| Error::MalformedCsv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(malformed)?.clone();
    let group_index = column_index(&headers, GROUP_COLUMN).ok_or_else(|| Error::MissingColumn {
        path: path.to_path_buf(),
        column: GROUP_COLUMN,
    })?;
    let name_index = column_index(&headers, NAME_COLUMN).ok_or_else(|| Error::MissingColumn {
        path: path.to_path_buf(),
        column: NAME_COLUMN,
    })?;

    let mut retained = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let group = field(&record, group_index, GROUP_COLUMN, path)?;
        if is_excluded_group(group) {
            dropped += 1;
            continue;
        }
        let user = field(&record, name_index, NAME_COLUMN, path)?;
        retained.push((group.to_string(), user.to_string()));
    }

    let mut membership = GroupMembership::new();
    for (group, _) in &retained {
        membership.insert_if_absent(group);
    }
    for (group, user) in retained {
        membership.push_member(&group, user);
    }

    debug!("Dropped {dropped} rows of excluded groups");
    info!(
        "Loaded {} groups from {}",
        membership.len(),
        path.display()
    );
    Ok(membership)
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    column: &'static str,
    path: &Path,
) -> Result<&'r str> {
    record.get(index).ok_or_else(|| Error::MissingColumn {
        path: path.to_path_buf(),
        column,
    })
}

fn column_index(headers: &StringRecord, column: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}') == column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_groups_are_matched_exactly() {
        assert!(is_excluded_group("GIS_HW_USERS"));
        assert!(!is_excluded_group("gis_hw_users"));
        assert!(!is_excluded_group("GIS_HW_USERS_EDIT"));
    }

    #[test]
    fn field_outside_the_record_is_a_missing_column() {
        let record = StringRecord::from(vec!["GroupA"]);
        let path = Path::new("members.csv");
        assert_eq!(field(&record, 0, GROUP_COLUMN, path).unwrap(), "GroupA");
        assert!(matches!(
            field(&record, 1, NAME_COLUMN, path),
            Err(Error::MissingColumn { column: NAME_COLUMN, .. })
        ));
    }

    #[test]
    fn column_lookup_ignores_a_leading_byte_order_mark() {
        let headers = StringRecord::from(vec!["\u{feff}Group Name", "Name"]);
        assert_eq!(column_index(&headers, GROUP_COLUMN), Some(0));
        assert_eq!(column_index(&headers, NAME_COLUMN), Some(1));
        assert_eq!(column_index(&headers, "Email"), None);
    }
}
