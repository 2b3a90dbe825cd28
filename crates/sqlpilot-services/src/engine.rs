//! Distributed query engine: asynchronous submit, poll, fetch.
//!
//! The engine offers no push notification, so callers poll `poll` until a
//! terminal state appears. Results come back as raw string rows whose first
//! row is a header naming the columns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;
use crate::http::{decode_json, trim_base_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryStatus {
    pub state: QueryState,
    /// State-change reason reported by the engine on FAILED/CANCELLED.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Raw tabular result as the engine returns it. `rows[0]` is the header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResultSet {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    sql: &'a str,
    database: &'a str,
    output_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    execution_id: String,
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a statement; returns the engine-assigned execution id.
    async fn start(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<String, ServiceError>;

    async fn poll(&self, execution_id: &str) -> Result<QueryStatus, ServiceError>;

    async fn fetch_results(&self, execution_id: &str) -> Result<RawResultSet, ServiceError>;
}

/// HTTP engine client:
/// `POST {base}/executions`, `GET {base}/executions/{id}`,
/// `GET {base}/executions/{id}/results`.
pub struct HttpQueryEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQueryEngine {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
        }
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn start(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/executions", self.base_url);
        let request = StartRequest {
            sql,
            database,
            output_location,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let body: StartResponse = decode_json(response).await?;
        debug!(execution_id = %body.execution_id, "query submitted");
        Ok(body.execution_id)
    }

    async fn poll(&self, execution_id: &str) -> Result<QueryStatus, ServiceError> {
        let url = format!("{}/executions/{execution_id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode_json(response).await
    }

    async fn fetch_results(&self, execution_id: &str) -> Result<RawResultSet, ServiceError> {
        let url = format!("{}/executions/{execution_id}/results", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_state_decodes_engine_vocabulary() {
        let status: QueryStatus =
            serde_json::from_str(r#"{"state": "RUNNING"}"#).unwrap();
        assert_eq!(status.state, QueryState::Running);
        assert!(!status.state.is_terminal());
        assert!(status.reason.is_none());

        let status: QueryStatus = serde_json::from_str(
            r#"{"state": "FAILED", "reason": "COLUMN_NOT_FOUND: line 3"}"#,
        )
        .unwrap();
        assert!(status.state.is_terminal());
        assert_eq!(status.reason.as_deref(), Some("COLUMN_NOT_FOUND: line 3"));
    }

    #[test]
    fn raw_result_set_defaults_missing_fields() {
        let raw: RawResultSet = serde_json::from_str("{}").unwrap();
        assert!(raw.columns.is_empty());
        assert!(raw.rows.is_empty());
    }

    #[test]
    fn start_request_serializes_camel_case() {
        let request = StartRequest {
            sql: "SELECT 1",
            database: "sales_db",
            output_location: "results://sqlpilot/",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sql"], "SELECT 1");
        assert_eq!(json["outputLocation"], "results://sqlpilot/");
    }
}
