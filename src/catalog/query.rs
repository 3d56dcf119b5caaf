use serde::{Deserialize, Serialize};

use crate::catalog::filters::{
    EXCLUDED_ROLES, EXCLUDED_ROLE_PATTERNS, EXCLUDED_TABLE_PATTERNS, ROLE_PREFIX_PATTERN,
    USER_TABLE_TYPE,
};

/// Result column holding the grantee role name.
pub const ROLE_COLUMN: &str = "DatabaseRole";
/// Result column holding the granted table name.
pub const TABLE_COLUMN: &str = "TableName";

/// One `(role, table)` grant returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RolePermissionRow {
    /// Database principal holding the permission, e.g. `HRM\GIS_PARKS`.
    pub role_name: String,
    /// Table the permission applies to.
    pub table_name: String,
}

impl RolePermissionRow {
    /// Build a row from any string-like pair.
    pub fn new(role_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            table_name: table_name.into(),
        }
    }
}

/// Render the fixed, parameterless permissions query.
///
/// Every filter runs server side: user tables only, no Esri delta/archive,
/// system, or auxiliary tables, and only `HRM` roles outside the denylist and
/// the read-only families. Rows come back ordered by role then table, and a
/// table granted in more than one schema appears once per schema.
pub fn role_tables_query() -> String {
    let mut lines = vec![
        "SELECT".to_string(),
        format!("    dp.name AS {ROLE_COLUMN},"),
        format!("    o.name AS {TABLE_COLUMN}"),
        "FROM sys.database_permissions p".to_string(),
        "JOIN sys.objects o".to_string(),
        "    ON p.major_id = o.object_id".to_string(),
        "JOIN sys.database_principals dp".to_string(),
        "    ON p.grantee_principal_id = dp.principal_id".to_string(),
        format!("WHERE o.type = {}", quote_literal(USER_TABLE_TYPE)),
    ];
    lines.extend(
        EXCLUDED_TABLE_PATTERNS
            .iter()
            .map(|pattern| format!("  AND o.name NOT LIKE {}", quote_literal(pattern))),
    );
    lines.push(format!(
        "  AND dp.name LIKE {}",
        quote_literal(ROLE_PREFIX_PATTERN)
    ));
    let denylist = EXCLUDED_ROLES
        .iter()
        .map(|role| quote_literal(role))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("  AND dp.name NOT IN ({denylist})"));
    lines.extend(
        EXCLUDED_ROLE_PATTERNS
            .iter()
            .map(|pattern| format!("  AND dp.name NOT LIKE {}", quote_literal(pattern))),
    );
    lines.push("GROUP BY dp.name, SCHEMA_NAME(o.schema_id), o.name".to_string());
    lines.push(format!("ORDER BY {ROLE_COLUMN}, {TABLE_COLUMN};"));
    lines.join("\n")
}

/// Quote a T-SQL string literal. Backslashes are not escapes in T-SQL.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
