//! Orchestration layer of the SQLPilot pipeline.
//!
//! Wires the collaborator services into the self-correcting flow:
//! grounding (entity extraction + schema retrieval), SQL generation with
//! fixed prompt templates, polled execution on the remote engine, and the
//! bounded correction loop that feeds engine errors back into generation.

pub mod config;
pub mod context;
pub mod controller;
pub mod executor;
pub mod generation;
pub mod grounding;
pub mod logging;
pub mod schema_catalog;

pub use config::{Config, ConfigError};
pub use context::PipelineContext;
pub use controller::Pipeline;
pub use executor::QueryExecutor;
pub use generation::GenerationClient;
pub use grounding::{Grounding, GroundingError, GroundingRetriever};
pub use schema_catalog::SchemaCatalog;
