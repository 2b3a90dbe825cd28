//! Catalog-backed schema lookup.

use std::sync::Arc;

use sqlpilot_core::{ColumnSchema, SchemaDescriptor};
use sqlpilot_services::{CatalogService, ServiceError};
use tracing::info;

/// Reads table and column metadata for a named database straight from the
/// catalog service.
///
/// An unreachable catalog surfaces as `Err`, while a database with no
/// tables is `Ok` with an empty vector; callers choose how far to degrade
/// instead of both cases collapsing into "no schema".
pub struct SchemaCatalog {
    service: Arc<dyn CatalogService>,
}

impl SchemaCatalog {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self { service }
    }

    pub async fn fetch_schema(
        &self,
        database: &str,
    ) -> Result<Vec<SchemaDescriptor>, ServiceError> {
        let tables = self.service.list_tables(database).await?;
        info!(%database, tables = tables.len(), "fetched catalog schema");

        Ok(tables
            .into_iter()
            .map(|table| SchemaDescriptor {
                database: database.to_string(),
                table: table.name,
                locator: None,
                columns: table
                    .columns
                    .into_iter()
                    .map(|column| ColumnSchema {
                        name: column.name,
                        data_type: column.data_type,
                        description: None,
                    })
                    .collect(),
            })
            .collect())
    }
}
