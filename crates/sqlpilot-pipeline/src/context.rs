//! Shared service context.
//!
//! All collaborator clients are constructed once per process and handed to
//! components by reference-counted handle. Nothing here is global: two
//! contexts (say, against different endpoints) can coexist in one process.

use std::sync::Arc;
use std::time::Duration;

use sqlpilot_services::{
    CatalogService, HttpCatalogService, HttpKnowledgeBaseService, HttpModelService,
    HttpQueryEngine, KnowledgeBaseService, ModelService, QueryEngine,
};

use crate::config::{Config, ConfigError};

/// The collaborator services plus the configuration they were built from.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Config,
    pub catalog: Arc<dyn CatalogService>,
    pub model: Arc<dyn ModelService>,
    pub knowledge_base: Arc<dyn KnowledgeBaseService>,
    pub engine: Arc<dyn QueryEngine>,
}

impl PipelineContext {
    /// Build the production HTTP clients from configuration. One HTTP
    /// connection pool is shared across all four services.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let catalog = Arc::new(HttpCatalogService::new(
            client.clone(),
            &config.endpoints.catalog_url,
        ));
        let model = Arc::new(
            HttpModelService::new(
                client.clone(),
                &config.endpoints.model_url,
                &config.model.model_id,
            )
            .with_api_key(Config::model_api_key()),
        );
        let knowledge_base = Arc::new(HttpKnowledgeBaseService::new(
            client.clone(),
            &config.endpoints.knowledge_base_url,
            &config.model.knowledge_base_id,
            &config.model.model_ref,
        ));
        let engine = Arc::new(HttpQueryEngine::new(client, &config.endpoints.engine_url));

        Ok(Self {
            config,
            catalog,
            model,
            knowledge_base,
            engine,
        })
    }

    /// Assemble a context from explicit service handles. This is how tests
    /// (and embedders with their own client implementations) wire the
    /// pipeline.
    pub fn with_services(
        config: Config,
        catalog: Arc<dyn CatalogService>,
        model: Arc<dyn ModelService>,
        knowledge_base: Arc<dyn KnowledgeBaseService>,
        engine: Arc<dyn QueryEngine>,
    ) -> Self {
        Self {
            config,
            catalog,
            model,
            knowledge_base,
            engine,
        }
    }
}
