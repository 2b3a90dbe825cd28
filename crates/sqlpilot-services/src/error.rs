//! Service-level errors shared by the HTTP clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("failed to decode service response: {0}")]
    Decode(String),
}
