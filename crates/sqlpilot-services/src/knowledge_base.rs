//! Knowledge-base retrieval service.
//!
//! Retrieval responses arrive as a citations envelope; the pipeline only
//! cares about the retrieved reference texts, each of which is expected to
//! be a schema document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;
use crate::http::{decode_json, trim_base_url};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    input: RetrieveInput<'a>,
    knowledge_base_id: &'a str,
    model_ref: &'a str,
}

#[derive(Debug, Serialize)]
struct RetrieveInput<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    citations: Vec<Citation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Citation {
    #[serde(default)]
    retrieved_references: Vec<RetrievedReference>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievedReference {
    #[serde(default)]
    content: ReferenceContent,
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceContent {
    #[serde(default)]
    text: String,
}

#[async_trait]
pub trait KnowledgeBaseService: Send + Sync {
    /// Run a retrieval-and-generation query and return the retrieved
    /// reference texts, flattened across citations.
    async fn retrieve_and_generate(&self, query: &str) -> Result<Vec<String>, ServiceError>;
}

/// HTTP knowledge-base client: `POST {base}/retrieve-and-generate`.
pub struct HttpKnowledgeBaseService {
    client: reqwest::Client,
    base_url: String,
    knowledge_base_id: String,
    model_ref: String,
}

impl HttpKnowledgeBaseService {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        knowledge_base_id: &str,
        model_ref: &str,
    ) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            knowledge_base_id: knowledge_base_id.to_string(),
            model_ref: model_ref.to_string(),
        }
    }
}

#[async_trait]
impl KnowledgeBaseService for HttpKnowledgeBaseService {
    async fn retrieve_and_generate(&self, query: &str) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/retrieve-and-generate", self.base_url);
        let request = RetrieveRequest {
            input: RetrieveInput { text: query },
            knowledge_base_id: &self.knowledge_base_id,
            model_ref: &self.model_ref,
        };
        debug!(knowledge_base = %self.knowledge_base_id, "retrieving schema documents");

        let response = self.client.post(&url).json(&request).send().await?;
        let body: RetrieveResponse = decode_json(response).await?;

        let texts = body
            .citations
            .into_iter()
            .flat_map(|c| c.retrieved_references)
            .map(|r| r.content.text)
            .filter(|t| !t.is_empty())
            .collect();
        Ok(texts)
    }
}
