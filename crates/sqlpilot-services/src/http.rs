//! Shared response handling for the HTTP service clients.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

/// Check the HTTP status and decode the JSON body. Non-2xx responses carry
/// the body text as the error detail so engine/model diagnostics survive.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api {
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
