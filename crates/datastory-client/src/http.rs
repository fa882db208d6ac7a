use datastory_core::error::{DatastoryError, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Send a request and turn non-2xx responses into `RemoteRequest` errors
/// carrying the status code and the raw body text.
pub(crate) async fn send(url: &str, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| DatastoryError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(url, status = status.as_u16(), "Remote request failed");
        return Err(DatastoryError::RemoteRequest {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

pub(crate) async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| DatastoryError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Join a base URL and a path without doubling the separator
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
