//! External collaborator contracts for the SQLPilot pipeline.
//!
//! Four services sit at the pipeline's boundary: the schema catalog, the
//! generative model endpoint, the knowledge-base retrieval service, and the
//! distributed query engine. Each is an `async_trait` so the orchestration
//! layer (and its tests) can swap implementations; the HTTP clients here
//! are the production ones.

pub mod catalog;
pub mod engine;
pub mod error;
mod http;
pub mod knowledge_base;
pub mod model;

pub use catalog::{CatalogService, ColumnMetadata, HttpCatalogService, TableMetadata};
pub use engine::{HttpQueryEngine, QueryEngine, QueryState, QueryStatus, RawResultSet};
pub use error::ServiceError;
pub use knowledge_base::{HttpKnowledgeBaseService, KnowledgeBaseService};
pub use model::{HttpModelService, ModelService};
