//! Table schema descriptors and the prompt context built from them.
//!
//! A [`SchemaDescriptor`] comes from one of two places: exact metadata
//! returned by the catalog service, or a schema document retrieved from the
//! knowledge base. Knowledge-base documents are free text produced upstream,
//! so decoding them is a validated boundary: a document either becomes a
//! typed descriptor or is rejected with a [`SchemaDocError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SchemaDocError {
    #[error("schema document is not valid JSON: {0}")]
    Document(String),
}

/// One column of a table: technical name and type, plus the business
/// description when the knowledge base carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One table's identity and column layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Catalog database the table lives in. Empty when unknown.
    pub database: String,
    pub table: String,
    /// Fully-qualified resource locator, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub columns: Vec<ColumnSchema>,
}

/// Wire format of a knowledge-base schema document. The column lists are
/// JSON-encoded strings nested inside the document, matching how the
/// catalog exports them.
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    locator: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    business_columns_json: String,
    #[serde(default)]
    technical_columns_json: String,
}

#[derive(Debug, Deserialize)]
struct TechnicalColumn {
    #[serde(rename = "columnName", default)]
    column_name: String,
    #[serde(rename = "dataType", default)]
    data_type: String,
}

#[derive(Debug, Deserialize)]
struct BusinessColumn {
    #[serde(default)]
    description: String,
}

/// Parse the database segment out of a structured table locator, e.g.
/// `resource:catalog:prod:table/sales_db/orders` -> `sales_db`.
///
/// Returns an empty string when the locator does not have the expected
/// shape; the caller treats an unknown database as "not yet known" rather
/// than an error.
pub fn database_from_locator(locator: &str) -> String {
    locator
        .rsplit(':')
        .next()
        .and_then(|path| path.split('/').nth(1))
        .unwrap_or_default()
        .to_string()
}

fn decode_column_list<'a, T: Deserialize<'a>>(raw: &'a str, kind: &str) -> Vec<T> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("malformed {kind} column list in schema document: {e}");
            Vec::new()
        }
    }
}

impl SchemaDescriptor {
    /// Decode a knowledge-base schema document into a descriptor.
    ///
    /// Technical and business column lists are zipped positionally when both
    /// are present; a missing or malformed business list falls back to
    /// technical-only columns instead of failing the document.
    pub fn from_schema_document(text: &str) -> Result<Self, SchemaDocError> {
        let doc: SchemaDocument =
            serde_json::from_str(text).map_err(|e| SchemaDocError::Document(e.to_string()))?;

        let technical: Vec<TechnicalColumn> =
            decode_column_list(&doc.technical_columns_json, "technical");
        let business: Vec<BusinessColumn> =
            decode_column_list(&doc.business_columns_json, "business");

        let columns = if business.is_empty() {
            technical
                .into_iter()
                .map(|t| ColumnSchema {
                    name: t.column_name,
                    data_type: t.data_type,
                    description: None,
                })
                .collect()
        } else {
            technical
                .into_iter()
                .zip(business)
                .map(|(t, b)| ColumnSchema {
                    name: t.column_name,
                    data_type: t.data_type,
                    description: Some(b.description),
                })
                .collect()
        };

        Ok(SchemaDescriptor {
            database: database_from_locator(&doc.locator),
            table: doc.name,
            locator: (!doc.locator.is_empty()).then(|| doc.locator),
            columns,
        })
    }
}

/// Ordered set of table descriptors rendered as prompt context for SQL
/// generation. The rendering stays stable for the lifetime of one pipeline
/// run so every correction attempt sees the same schema text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaContext {
    pub tables: Vec<SchemaDescriptor>,
}

impl SchemaContext {
    pub fn new(tables: Vec<SchemaDescriptor>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Database name established by the descriptors: the last table with a
    /// known database wins, mirroring how the locators are scanned.
    pub fn database(&self) -> Option<&str> {
        self.tables
            .iter()
            .rev()
            .find(|t| !t.database.is_empty())
            .map(|t| t.database.as_str())
    }

    /// Render the textual schema block embedded in generation prompts.
    pub fn to_prompt_block(&self) -> String {
        let mut block = String::new();
        for table in &self.tables {
            if let Some(locator) = &table.locator {
                block.push_str(&format!("\nTable Locator: {locator}\n"));
            } else {
                block.push('\n');
            }
            block.push_str(&format!("Table Name: {}\n", table.table));
            block.push_str("Table Columns:\n");
            for col in &table.columns {
                match &col.description {
                    Some(desc) => {
                        block.push_str(&format!("{} {}, -- {}\n", col.name, col.data_type, desc))
                    }
                    None => block.push_str(&format!("{} {},\n", col.name, col.data_type)),
                }
            }
        }
        block
    }
}
