use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::access::role_tables::RoleTables;
use crate::catalog::filters::{is_auditable_role, is_auditable_table};
use crate::catalog::query::RolePermissionRow;
use crate::catalog::source::{CatalogConnector, CatalogTarget, RoleCatalog};
use crate::error::Result;
use crate::output::formatter::load_role_tables;

/// Serves every target from one previously written role → tables mapping.
///
/// Rows pass through the same role and table rules the live query applies,
/// so a hand-edited snapshot cannot smuggle in excluded grants.
#[derive(Debug, Clone)]
pub struct SnapshotConnector {
    role_tables: RoleTables,
}

impl SnapshotConnector {
    /// Wrap an in-memory mapping.
    pub fn new(role_tables: RoleTables) -> Self {
        Self { role_tables }
    }

    /// Read a `groups_and_tables.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let role_tables = load_role_tables(path)?;
        info!(
            "Loaded {} roles from snapshot {}",
            role_tables.len(),
            path.display()
        );
        Ok(Self::new(role_tables))
    }
}

#[async_trait]
impl CatalogConnector for SnapshotConnector {
    async fn connect(&self, target: &CatalogTarget) -> Result<Box<dyn RoleCatalog>> {
        debug!("Replaying snapshot for {}", target.name);
        Ok(Box::new(SnapshotCatalog {
            rows: self.role_tables.rows(),
        }))
    }
}

struct SnapshotCatalog {
    rows: Vec<RolePermissionRow>,
}

#[async_trait]
impl RoleCatalog for SnapshotCatalog {
    async fn role_permissions(&mut self) -> Result<Vec<RolePermissionRow>> {
        let total = self.rows.len();
        let rows: Vec<RolePermissionRow> = std::mem::take(&mut self.rows)
            .into_iter()
            .filter(|row| is_auditable_role(&row.role_name) && is_auditable_table(&row.table_name))
            .collect();
        if rows.len() < total {
            debug!("Dropped {} excluded snapshot rows", total - rows.len());
        }
        Ok(rows)
    }
}
