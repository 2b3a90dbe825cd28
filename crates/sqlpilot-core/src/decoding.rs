//! Decoding configuration for generative model calls.

use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every model invocation. Each call carries
/// its own config; the pipeline keeps no conversational state between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl DecodingConfig {
    /// Deterministic decoding for SQL generation and entity extraction.
    pub fn deterministic() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.0,
            top_k: 250,
            top_p: 0.999,
            stop_sequences: Vec::new(),
        }
    }

    /// Higher-temperature decoding for open-ended text.
    pub fn exploratory() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            top_k: 250,
            top_p: 1.0,
            stop_sequences: Vec::new(),
        }
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self::deterministic()
    }
}
