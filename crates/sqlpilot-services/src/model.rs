//! Generative model service: one synchronous completion per call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlpilot_core::DecodingConfig;
use tracing::debug;

use crate::error::ServiceError;
use crate::http::{decode_json, trim_base_url};

/// Wrap a prompt in the role-tagged human/assistant convention the model
/// endpoint expects.
pub fn role_tagged(prompt: &str) -> String {
    format!("\n\nHuman: {prompt}\n\nAssistant:")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    completion: String,
}

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Invoke the model once with the given prompt and decoding parameters,
    /// returning the trimmed completion text.
    ///
    /// Failures are not absorbed here: there is no local fallback for a
    /// broken model endpoint, so the caller decides whether to abort.
    async fn invoke(&self, prompt: &str, decoding: &DecodingConfig)
        -> Result<String, ServiceError>;
}

/// HTTP model client: `POST {base}/model/{model_id}/invoke`.
pub struct HttpModelService {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
    api_key: Option<String>,
}

impl HttpModelService {
    pub fn new(client: reqwest::Client, base_url: &str, model_id: &str) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            model_id: model_id.to_string(),
            api_key: None,
        }
    }

    /// Attach a bearer credential to every invocation.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

#[async_trait]
impl ModelService for HttpModelService {
    async fn invoke(
        &self,
        prompt: &str,
        decoding: &DecodingConfig,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/model/{}/invoke", self.base_url, self.model_id);
        let request = InvokeRequest {
            prompt: role_tagged(prompt),
            max_tokens_to_sample: decoding.max_tokens,
            temperature: decoding.temperature,
            top_k: decoding.top_k,
            top_p: decoding.top_p,
            stop_sequences: &decoding.stop_sequences,
        };
        debug!(model = %self.model_id, prompt_len = prompt.len(), "invoking model");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let body: InvokeResponse = decode_json(response).await?;
        Ok(body.completion.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tagging_wraps_the_prompt() {
        let tagged = role_tagged("Generate a SQL statement.");
        assert!(tagged.starts_with("\n\nHuman: "));
        assert!(tagged.ends_with("\n\nAssistant:"));
        assert!(tagged.contains("Generate a SQL statement."));
    }

    #[test]
    fn invoke_request_serializes_camel_case_fields() {
        let decoding = DecodingConfig::deterministic();
        let request = InvokeRequest {
            prompt: role_tagged("hello"),
            max_tokens_to_sample: decoding.max_tokens,
            temperature: decoding.temperature,
            top_k: decoding.top_k,
            top_p: decoding.top_p,
            stop_sequences: &decoding.stop_sequences,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["maxTokensToSample"], 4096);
        assert_eq!(json["temperature"], 0.0);
        assert!(json["stopSequences"].as_array().unwrap().is_empty());
    }

    #[test]
    fn completion_defaults_to_empty_when_absent() {
        let body: InvokeResponse = serde_json::from_str("{}").unwrap();
        assert!(body.completion.is_empty());
    }
}
