//! Core data model for the SQLPilot query pipeline.
//!
//! Pure types shared by the service clients and the orchestration layer:
//! table schema descriptors, decoding configuration, execution outcomes,
//! and the terminal pipeline result. No I/O happens here.

pub mod cancel;
pub mod decoding;
pub mod outcome;
pub mod schema;

pub use cancel::CancellationToken;
pub use decoding::DecodingConfig;
pub use outcome::{
    AbortReason, ExecutionFailure, ExecutionOutcome, PipelineOutcome, PipelineResult, ResultSet,
    SqlAttempt,
};
pub use schema::{ColumnSchema, SchemaContext, SchemaDescriptor, SchemaDocError};
