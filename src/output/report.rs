use std::io::{self, Write};

use crate::access::editors::TableEditors;
use crate::access::index::{GroupView, TableView, UserView};

/// Print one block per table: its name, its editor list, and a blank line.
pub fn write_editor_report(editors: &TableEditors, out: &mut dyn Write) -> io::Result<()> {
    for (table, names) in editors.iter() {
        writeln!(out, "Table: {table}")?;
        writeln!(out, "Editors: {}", format_editor_list(names))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Render names as a bracketed, quoted list such as `['alice', 'bob']`.
pub fn format_editor_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| quote_name(name)).collect();
    format!("[{}]", quoted.join(", "))
}

// Single quotes unless the name holds one and no double quote.
fn quote_name(name: &str) -> String {
    let escaped = name.replace('\\', r"\\");
    if name.contains('\'') && !name.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', r"\'"))
    }
}

/// Short label for a selection: the name itself, or a count such as `3 tables`.
pub fn selection_label(names: &[&str], noun: &str) -> String {
    match names {
        [] => format!("no {noun}s"),
        [single] => (*single).to_string(),
        _ => format!("{} {noun}s", names.len()),
    }
}

/// Who can edit the selected tables.
pub fn write_table_view(out: &mut dyn Write, tables: &[&str], view: &TableView) -> io::Result<()> {
    writeln!(out, "Table view: {}", selection_label(tables, "table"))?;
    writeln!(out, "Granting groups: {}", join_or_none(&view.groups))?;
    if view.users.is_empty() {
        writeln!(out, "No users with edit access.")?;
        return Ok(());
    }
    writeln!(out, "Editors ({}):", view.users.len())?;
    for user in &view.users {
        writeln!(out, "  {}  [{}]", user.name, user.groups.join(", "))?;
    }
    Ok(())
}

/// What the selected users can edit.
pub fn write_user_view(out: &mut dyn Write, users: &[&str], view: &UserView) -> io::Result<()> {
    writeln!(out, "User view: {}", selection_label(users, "user"))?;
    writeln!(out, "Groups: {}", join_or_none(&view.groups))?;
    if view.tables.is_empty() {
        writeln!(out, "No editable tables.")?;
        return Ok(());
    }
    writeln!(out, "Tables ({}):", view.tables.len())?;
    for table in &view.tables {
        writeln!(out, "  {}  [{}]", table.table, table.groups.join(", "))?;
    }
    Ok(())
}

/// Members and tables of the selected groups.
pub fn write_group_view(out: &mut dyn Write, groups: &[&str], view: &GroupView) -> io::Result<()> {
    writeln!(out, "Group view: {}", selection_label(groups, "group"))?;
    if view.members.is_empty() {
        writeln!(out, "No known members.")?;
    } else {
        writeln!(out, "Members ({}):", view.members.len())?;
        for member in &view.members {
            writeln!(out, "  {member}")?;
        }
    }
    if view.tables.is_empty() {
        writeln!(out, "No tables mapped for this selection.")?;
    } else {
        writeln!(out, "Tables ({}):", view.tables.len())?;
        for table in &view.tables {
            writeln!(out, "  {table}")?;
        }
    }
    Ok(())
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn editor_list_matches_the_console_format() {
        assert_eq!(format_editor_list(&names(&["alice", "bob"])), "['alice', 'bob']");
        assert_eq!(format_editor_list(&[]), "[]");
    }

    #[test]
    fn names_with_quotes_switch_delimiters() {
        assert_eq!(format_editor_list(&names(&["O'Brien, Pat"])), r#"["O'Brien, Pat"]"#);
        assert_eq!(format_editor_list(&names(&[r#"a'b"c"#])), r#"['a\'b"c']"#);
    }

    #[test]
    fn selection_labels() {
        assert_eq!(selection_label(&["PARKS"], "table"), "PARKS");
        assert_eq!(selection_label(&["A", "B", "C"], "table"), "3 tables");
        assert_eq!(selection_label(&[], "group"), "no groups");
    }

    #[test]
    fn empty_report_prints_nothing() {
        let mut out = Vec::new();
        write_editor_report(&TableEditors::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
