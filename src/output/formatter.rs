use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::access::editors::TableEditors;
use crate::access::role_tables::{aggregate, RoleTables};
use crate::error::{Error, Result};
use crate::membership::group_membership::GroupMembership;
use crate::output::report;

/// File the group → members mapping is written to.
pub const EDITORS_FILE_NAME: &str = "groups_and_editors.json";
/// File the role → tables mapping is written to.
pub const TABLES_FILE_NAME: &str = "groups_and_tables.json";

/// Serialize `value` as JSON indented by four spaces, without a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Write `membership` to [`EDITORS_FILE_NAME`] in `output_dir`, replacing any previous file.
pub fn write_group_membership(output_dir: &Path, membership: &GroupMembership) -> Result<PathBuf> {
    write_json(output_dir, EDITORS_FILE_NAME, membership)
}

/// Write `role_tables` to [`TABLES_FILE_NAME`] in `output_dir`, replacing any previous file.
pub fn write_role_tables(output_dir: &Path, role_tables: &RoleTables) -> Result<PathBuf> {
    write_json(output_dir, TABLES_FILE_NAME, role_tables)
}

/// Persist both mappings and print the per-table editor report to `console`.
///
/// Re-running with the same inputs rewrites byte-identical files.
#[tracing::instrument(skip_all)]
pub fn write_report(
    membership: &GroupMembership,
    role_tables: &RoleTables,
    editors: &TableEditors,
    output_dir: &Path,
    console: &mut dyn Write,
) -> Result<()> {
    write_group_membership(output_dir, membership)?;
    write_role_tables(output_dir, role_tables)?;
    report::write_editor_report(editors, console).map_err(|source| Error::Write {
        path: PathBuf::from("<stdout>"),
        source,
    })?;
    Ok(())
}

/// Read a mapping previously written by [`write_group_membership`], keeping its order.
pub fn load_group_membership(path: &Path) -> Result<GroupMembership> {
    read_json(path)
}

/// Read a mapping previously written by [`write_role_tables`].
///
/// Table lists are re-sorted and de-duplicated, so hand-edited files still
/// satisfy the mapping's ordering guarantees.
pub fn load_role_tables(path: &Path) -> Result<RoleTables> {
    let raw: RoleTables = read_json(path)?;
    Ok(aggregate(raw.rows()))
}

fn write_json<T: Serialize + ?Sized>(output_dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|source| Error::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(name);
    let bytes = to_pretty_json(value).map_err(|source| Error::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, bytes).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;

    info!("Wrote {}", path.display());
    Ok(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_json_reports_directory_creation_errors() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let blocker = dir.path().join("not_a_directory");
        std::fs::write(&blocker, "marker").expect("should create marker file");

        let err = write_group_membership(&blocker, &GroupMembership::new())
            .expect_err("directory creation should fail");
        assert!(matches!(err, Error::Write { .. }), "unexpected error: {err}");
    }

    #[test]
    fn pretty_json_uses_four_space_indent_and_no_trailing_newline() {
        let membership: GroupMembership = [("GroupA", vec!["alice"])].into_iter().collect();
        let text = String::from_utf8(to_pretty_json(&membership).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"GroupA\": [\n        \"alice\"\n    ]\n}");
    }

    #[test]
    fn empty_member_lists_stay_inline() {
        let membership: GroupMembership = [("GroupA", Vec::<String>::new())].into_iter().collect();
        let text = String::from_utf8(to_pretty_json(&membership).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"GroupA\": []\n}");
    }

    #[test]
    fn loading_a_missing_mapping_is_file_not_found() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let err = load_role_tables(&dir.path().join(TABLES_FILE_NAME)).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn loading_role_tables_restores_ordering_guarantees() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join(TABLES_FILE_NAME);
        std::fs::write(&path, r#"{"HRM\\B": ["T2", "T1", "T2"], "HRM\\A": []}"#).unwrap();

        let role_tables = load_role_tables(&path).unwrap();
        assert_eq!(role_tables.roles().collect::<Vec<_>>(), [r"HRM\B"]);
        assert_eq!(
            role_tables.get(r"HRM\B"),
            Some(&["T1".to_string(), "T2".to_string()][..])
        );
    }
}
