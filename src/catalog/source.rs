use std::fmt;

use async_trait::async_trait;

use crate::catalog::query::RolePermissionRow;
use crate::error::Result;

/// A catalog to audit: its logical name and opaque connection descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogTarget {
    /// Logical name from the `[server]` table, e.g. `prod_rw`.
    pub name: String,
    /// Connection descriptor; may carry credentials.
    pub descriptor: String,
}

impl CatalogTarget {
    /// Pair a logical name with its descriptor.
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

// Descriptors are connection strings with passwords in them.
impl fmt::Debug for CatalogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogTarget")
            .field("name", &self.name)
            .field("descriptor", &"<redacted>")
            .finish()
    }
}

/// An open permissions catalog.
#[async_trait]
pub trait RoleCatalog: Send {
    /// Run the permissions query and return its rows in server order.
    async fn role_permissions(&mut self) -> Result<Vec<RolePermissionRow>>;
}

/// Opens a [`RoleCatalog`] for a configured target.
#[async_trait]
pub trait CatalogConnector: Sync {
    /// Connect to `target`, failing with [`crate::error::Error::Connection`].
    async fn connect(&self, target: &CatalogTarget) -> Result<Box<dyn RoleCatalog>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_descriptor() {
        let target = CatalogTarget::new("prod_rw", "server=gis;password=hunter2");
        let rendered = format!("{target:?}");
        assert!(rendered.contains("prod_rw"));
        assert!(!rendered.contains("hunter2"));
    }
}
