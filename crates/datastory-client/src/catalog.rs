use async_trait::async_trait;
use datastory_core::auth::AccessToken;
use datastory_core::config::DEFAULT_CATALOG_URL;
use datastory_core::error::{DatastoryError, Result};
use datastory_core::models::{
    CatalogResource, CatalogResponse, NewResource, Package, PackageChanges, PackageSearchResult,
    ResourceChanges,
};
use datastory_core::ports::CatalogApi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::http;

/// CKAN-style catalog client
///
/// Every action is sent as `POST {base_url}/api/3/action/{action}` with a
/// JSON body, and the `{success, result, error}` envelope is unwrapped here
/// so callers only ever see the result or a `DatastoryError`.
pub struct CatalogClient {
    base_url: String,
    token: Option<AccessToken>,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn localhost() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }

    /// Authenticate subsequent actions; anonymous access works for reads only
    pub fn with_token(mut self, token: Option<AccessToken>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn action<B, T>(&self, action: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = http::join(&self.base_url, &format!("api/3/action/{}", action));
        tracing::debug!(action, url = %url, "Catalog request");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.as_str());
        }

        let response = http::send(&url, request).await?;
        let envelope: CatalogResponse<T> = http::decode(&url, response).await?;
        unwrap_envelope(action, envelope)
    }
}

fn unwrap_envelope<T>(action: &str, envelope: CatalogResponse<T>) -> Result<T> {
    if !envelope.success {
        let message = envelope
            .error
            .map(|e| {
                if e.error_type.is_empty() {
                    e.message
                } else {
                    format!("{}: {}", e.error_type, e.message)
                }
            })
            .unwrap_or_else(|| "no error details".to_string());
        return Err(DatastoryError::CatalogAction {
            action: action.to_string(),
            message,
        });
    }

    envelope.result.ok_or_else(|| DatastoryError::CatalogAction {
        action: action.to_string(),
        message: "response has no result".to_string(),
    })
}

/// Overlay the set fields of `changes` onto a full record
fn merge_changes<C: Serialize>(mut current: Value, changes: &C) -> Result<Value> {
    if let (Some(target), Value::Object(patch)) =
        (current.as_object_mut(), serde_json::to_value(changes)?)
    {
        target.extend(patch);
    }
    Ok(current)
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn package_search(
        &self,
        query: &str,
        rows: usize,
        start: usize,
    ) -> Result<PackageSearchResult> {
        let q = if query.trim().is_empty() { "*:*" } else { query };
        self.action("package_search", &json!({ "q": q, "rows": rows, "start": start }))
            .await
    }

    async fn package_show(&self, id: &str) -> Result<Package> {
        self.action("package_show", &json!({ "id": id })).await
    }

    async fn package_update(&self, id: &str, changes: &PackageChanges) -> Result<Package> {
        // package_update replaces the whole record, so merge onto the current one
        let current = self.action("package_show", &json!({ "id": id })).await?;
        self.action("package_update", &merge_changes(current, changes)?)
            .await
    }

    async fn resource_create(&self, resource: &NewResource) -> Result<CatalogResource> {
        self.action("resource_create", resource).await
    }

    async fn resource_update(&self, id: &str, changes: &ResourceChanges) -> Result<CatalogResource> {
        let current = self.action("resource_show", &json!({ "id": id })).await?;
        self.action("resource_update", &merge_changes(current, changes)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastory_core::models::CatalogErrorBody;

    #[test]
    fn test_unwrap_success() {
        let envelope = CatalogResponse {
            help: String::new(),
            success: true,
            result: Some(7),
            error: None,
        };
        assert_eq!(unwrap_envelope("package_show", envelope).unwrap(), 7);
    }

    #[test]
    fn test_unwrap_failure_carries_message() {
        let envelope: CatalogResponse<u32> = CatalogResponse {
            help: String::new(),
            success: false,
            result: None,
            error: Some(CatalogErrorBody {
                error_type: "Authorization Error".to_string(),
                message: "Access denied".to_string(),
            }),
        };
        let err = unwrap_envelope("package_update", envelope).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Catalog action package_update failed: Authorization Error: Access denied"
        );
    }

    #[test]
    fn test_merge_changes_keeps_untouched_fields() {
        let current = json!({"id": "pkg-1", "name": "oral-histories", "notes": "old"});
        let merged = merge_changes(current, &PackageChanges::notes("new")).unwrap();
        assert_eq!(merged, json!({"id": "pkg-1", "name": "oral-histories", "notes": "new"}));
    }

    #[test]
    fn test_token_is_optional() {
        let client = CatalogClient::localhost();
        assert!(client.token.is_none());
        let client = client.with_token(AccessToken::parse("abc"));
        assert!(client.token.is_some());
    }
}
