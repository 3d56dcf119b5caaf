//! CSV exports of the table, user and group views.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::access::index::AccessIndex;
use crate::error::{Error, Result};

/// File the audit writes every audited table's editors to when CSV export is requested.
pub const REPORT_EXPORT_NAME: &str = "report_multi_table_editors.csv";

/// Which view an export holds; decides the default file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// `Table,User,Granting Group` rows.
    Table,
    /// `User,Table,Granting Group` rows.
    User,
    /// `Group,Table` rows.
    Group,
}

/// Default export file name for a selection.
///
/// A single table keeps its name verbatim; user and group names are slugged.
/// Multi-item selections share one fixed name per kind.
pub fn default_export_name(kind: ExportKind, names: &[&str]) -> String {
    match (kind, names) {
        (ExportKind::Table, [table]) => format!("table_{table}_editors.csv"),
        (ExportKind::Table, _) => "table_multi_editors.csv".to_string(),
        (ExportKind::User, [user]) => format!("user_{}_tables.csv", slug(user)),
        (ExportKind::User, _) => "user_multi_tables.csv".to_string(),
        (ExportKind::Group, [group]) => format!("group_{}_tables.csv", slug(group)),
        (ExportKind::Group, _) => "group_multi_tables.csv".to_string(),
    }
}

/// Collapse every run of characters outside `[A-Za-z0-9]` into one `_`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_gap = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

/// Join a generated file name onto `dir`, refusing names that would leave it.
///
/// Table names land in export names verbatim, so a name must be one plain
/// path component: not blank, no separators, no `.`/`..` or drive prefix.
pub fn export_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let reject = |reason: &'static str| -> Result<PathBuf> {
        Err(Error::InvalidOutputName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return reject("name is blank");
    }
    if name.contains(['/', '\\']) {
        return reject("name contains a path separator");
    }
    match Path::new(name).components().collect::<Vec<_>>().as_slice() {
        [Component::Normal(part)] if *part == OsStr::new(name) => Ok(dir.join(name)),
        _ => reject("name is not a plain file name"),
    }
}

/// One row per `(table, editor, granting group)`, tables in selection order.
///
/// An editor without a granting group still gets one row, with the group empty.
pub fn export_table_editors(index: &AccessIndex, tables: &[&str], path: &Path) -> Result<usize> {
    let mut rows = Vec::new();
    for table in tables {
        for user in index.table_users(table) {
            if user.groups.is_empty() {
                rows.push(vec![table.to_string(), user.name.clone(), String::new()]);
            }
            for group in &user.groups {
                rows.push(vec![table.to_string(), user.name.clone(), group.clone()]);
            }
        }
    }
    write_rows(path, &["Table", "User", "Granting Group"], rows)
}

/// One row per distinct `(user, table, granting group)`, users in selection order.
pub fn export_user_tables(index: &AccessIndex, users: &[&str], path: &Path) -> Result<usize> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for user in users {
        for table in index.user_view(&[*user], None).tables {
            for group in table.groups {
                let row = vec![user.to_string(), table.table.clone(), group];
                if seen.insert(row.clone()) {
                    rows.push(row);
                }
            }
        }
    }
    write_rows(path, &["User", "Table", "Granting Group"], rows)
}

/// One row per `(group, table)`, groups in selection order.
pub fn export_group_tables(index: &AccessIndex, groups: &[&str], path: &Path) -> Result<usize> {
    let rows = groups.iter().flat_map(|group| {
        index
            .group_tables(group)
            .iter()
            .map(move |table| vec![group.to_string(), table.clone()])
    });
    write_rows(path, &["Group", "Table"], rows)
}

fn write_rows(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<usize> {
    let export_err = |source: csv::Error| Error::Export {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer.write_record(header).map_err(export_err)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row).map_err(export_err)?;
        count += 1;
    }
    writer.flush().map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Exported {count} rows to {}", path.display());
    Ok(count)
}
