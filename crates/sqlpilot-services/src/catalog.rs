//! Schema catalog service: table and column metadata for a database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;
use crate::http::{decode_json, trim_base_url};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

#[derive(Debug, Deserialize)]
struct ListTablesResponse {
    #[serde(default)]
    tables: Vec<TableMetadata>,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List every table in the named database with its column metadata.
    async fn list_tables(&self, database: &str) -> Result<Vec<TableMetadata>, ServiceError>;
}

/// HTTP catalog client: `GET {base}/databases/{database}/tables`.
pub struct HttpCatalogService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
        }
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn list_tables(&self, database: &str) -> Result<Vec<TableMetadata>, ServiceError> {
        let url = format!("{}/databases/{database}/tables", self.base_url);
        debug!(%database, "listing catalog tables");

        let response = self.client.get(&url).send().await?;
        let body: ListTablesResponse = decode_json(response).await?;
        Ok(body.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_metadata_decodes_catalog_payload() {
        let payload = r#"{
            "tables": [
                {"name": "orders", "columns": [
                    {"name": "order_id", "type": "string"},
                    {"name": "total", "type": "double"}
                ]}
            ]
        }"#;

        let body: ListTablesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(body.tables.len(), 1);
        assert_eq!(body.tables[0].name, "orders");
        assert_eq!(body.tables[0].columns[1].data_type, "double");
    }

    #[test]
    fn missing_tables_field_decodes_to_empty() {
        let body: ListTablesResponse = serde_json::from_str("{}").unwrap();
        assert!(body.tables.is_empty());
    }
}
