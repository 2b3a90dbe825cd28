//! Question grounding: narrow an open-ended question to the schema context
//! needed to answer it.
//!
//! Two steps: the model reduces the question to an entity/metric phrase,
//! then a semantic query built from that phrase retrieves table-schema
//! documents from the knowledge base. Each document passes through the
//! validated decode in `sqlpilot_core::schema`; documents that fail to
//! decode are skipped without taking the others down.

use std::sync::Arc;

use sqlpilot_core::{SchemaContext, SchemaDescriptor};
use sqlpilot_services::{KnowledgeBaseService, ServiceError};
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::GenerationClient;

#[derive(Debug, Error)]
pub enum GroundingError {
    /// Retrieval produced no decodable table schemas. Terminal: without
    /// schema context there is nothing to generate SQL against.
    #[error("no table schemas found in the knowledge base for entities: {0}")]
    NoSchemaFound(String),

    /// A collaborator call failed during grounding.
    #[error("grounding service call failed: {0}")]
    Service(#[from] ServiceError),
}

/// Established schema context for one pipeline run.
#[derive(Debug, Clone)]
pub struct Grounding {
    /// Database parsed from the retrieved table locators; empty when none
    /// of the locators carried one.
    pub database: String,
    /// Entity/metric phrase the retrieval query was built from.
    pub entities: String,
    pub context: SchemaContext,
}

pub struct GroundingRetriever {
    generation: GenerationClient,
    knowledge_base: Arc<dyn KnowledgeBaseService>,
}

impl GroundingRetriever {
    pub fn new(generation: GenerationClient, knowledge_base: Arc<dyn KnowledgeBaseService>) -> Self {
        Self {
            generation,
            knowledge_base,
        }
    }

    pub async fn ground(&self, question: &str) -> Result<Grounding, GroundingError> {
        let entities = self.generation.extract_entities(question).await?;
        info!(%entities, "extracted entities");

        let query = format!("List all table schema(s) that are relevant to {entities}");
        let documents = self.knowledge_base.retrieve_and_generate(&query).await?;
        info!(documents = documents.len(), "retrieved schema documents");

        let mut tables: Vec<SchemaDescriptor> = Vec::new();
        for document in &documents {
            match SchemaDescriptor::from_schema_document(document) {
                Ok(descriptor) => tables.push(descriptor),
                Err(e) => warn!("skipping schema document: {e}"),
            }
        }

        if tables.is_empty() {
            return Err(GroundingError::NoSchemaFound(entities));
        }

        let context = SchemaContext::new(tables);
        let database = context.database().unwrap_or_default().to_string();
        Ok(Grounding {
            database,
            entities,
            context,
        })
    }
}
