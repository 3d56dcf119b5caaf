use async_trait::async_trait;
use tiberius::{Client, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::catalog::query::{role_tables_query, RolePermissionRow, ROLE_COLUMN, TABLE_COLUMN};
use crate::catalog::source::{CatalogConnector, CatalogTarget, RoleCatalog};
use crate::error::{Error, Result};

/// Connects to SQL Server catalogs whose descriptors are ADO.NET connection strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerConnector;

#[async_trait]
impl CatalogConnector for SqlServerConnector {
    async fn connect(&self, target: &CatalogTarget) -> Result<Box<dyn RoleCatalog>> {
        let catalog = SqlServerCatalog::connect(target).await?;
        Ok(Box::new(catalog))
    }
}

/// An open TDS session against one catalog.
pub struct SqlServerCatalog {
    target: String,
    client: Client<Compat<TcpStream>>,
}

impl SqlServerCatalog {
    /// Parse the target's connection string and open a session.
    #[tracing::instrument(skip_all)]
    pub async fn connect(target: &CatalogTarget) -> Result<Self> {
        let connection_error = |message: String| Error::Connection {
            target: target.name.clone(),
            message,
        };

        let config = Config::from_ado_string(&target.descriptor)
            .map_err(|e| connection_error(format!("parsing connection string: {e}")))?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| connection_error(format!("connecting to {}: {e}", config.get_addr())))?;
        tcp.set_nodelay(true)
            .map_err(|e| connection_error(format!("setting nodelay socket option: {e}")))?;

        // tiberius speaks `futures` I/O, so adapt the tokio stream.
        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        info!("Connected to catalog {}", target.name);
        Ok(Self {
            target: target.name.clone(),
            client,
        })
    }
}

#[async_trait]
impl RoleCatalog for SqlServerCatalog {
    async fn role_permissions(&mut self) -> Result<Vec<RolePermissionRow>> {
        let target = &self.target;
        let query_error = |message: String| Error::Query {
            target: target.clone(),
            message,
        };

        let rows = self
            .client
            .simple_query(role_tables_query())
            .await
            .map_err(|e| query_error(e.to_string()))?
            .into_first_result()
            .await
            .map_err(|e| query_error(e.to_string()))?;
        debug!("Catalog {target} returned {} rows", rows.len());

        rows.iter()
            .map(|row| decode_row(row).map_err(query_error))
            .collect()
    }
}

fn decode_row(row: &Row) -> Result<RolePermissionRow, String> {
    let text = |column: &str| -> Result<String, String> {
        row.try_get::<&str, _>(column)
            .map_err(|e| format!("decoding column '{column}': {e}"))?
            .map(str::to_string)
            .ok_or_else(|| format!("missing column '{column}'"))
    };
    Ok(RolePermissionRow::new(text(ROLE_COLUMN)?, text(TABLE_COLUMN)?))
}
