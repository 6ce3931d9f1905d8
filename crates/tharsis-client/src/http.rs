use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::ApiError;
use crate::not_found;
use crate::traits::ManagedIdentityApi;
use crate::types::{
    AccessRuleEntity, CreateAccessRuleInput, CreateManagedIdentityInput, ManagedIdentityEntity,
    UpdateAccessRuleInput, UpdateManagedIdentityInput,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON/REST client for the Tharsis managed identity endpoints.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.api_url(path);
        debug!(%method, %url, "tharsis api request");
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.header("Accept", "application/json")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.request(reqwest::Method::GET, path).send().await?;
        handle_response(resp).await
    }

    async fn send_json<B, T>(&self, method: reqwest::Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(method, path).json(body).send().await?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.request(reqwest::Method::DELETE, path).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedIdentityApi for HttpClient {
    async fn create_managed_identity(
        &self,
        input: &CreateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError> {
        self.send_json(reqwest::Method::POST, "managed-identities", input)
            .await
    }

    async fn get_managed_identity(&self, id: &str) -> Result<ManagedIdentityEntity, ApiError> {
        self.get(&format!("managed-identities/{id}")).await
    }

    async fn update_managed_identity(
        &self,
        input: &UpdateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError> {
        let path = format!("managed-identities/{}", input.id);
        self.send_json(reqwest::Method::PATCH, &path, input).await
    }

    async fn delete_managed_identity(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("managed-identities/{id}")).await
    }

    async fn get_managed_identity_access_rules(
        &self,
        managed_identity_id: &str,
    ) -> Result<Vec<AccessRuleEntity>, ApiError> {
        self.get(&format!("managed-identities/{managed_identity_id}/access-rules"))
            .await
    }

    async fn create_managed_identity_access_rule(
        &self,
        input: &CreateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError> {
        self.send_json(reqwest::Method::POST, "managed-identity-access-rules", input)
            .await
    }

    async fn get_managed_identity_access_rule(
        &self,
        id: &str,
    ) -> Result<AccessRuleEntity, ApiError> {
        self.get(&format!("managed-identity-access-rules/{id}")).await
    }

    async fn update_managed_identity_access_rule(
        &self,
        input: &UpdateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError> {
        let path = format!("managed-identity-access-rules/{}", input.id);
        self.send_json(reqwest::Method::PATCH, &path, input).await
    }

    async fn delete_managed_identity_access_rule(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("managed-identity-access-rules/{id}"))
            .await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    trace!(%status, body_len = body.len(), "tharsis api response");

    if !status.is_success() {
        return Err(error_from_response(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::invalid_response(format!("Failed to parse response JSON: {e}")))
}

/// Maps an error response to [`ApiError`]. A 404, or a body carrying the
/// legacy not-found message, becomes `NotFound`.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> ApiError {
    let message = error_message(status, body);
    if status == reqwest::StatusCode::NOT_FOUND || not_found::is_not_found_message(&message) {
        return ApiError::not_found(message);
    }
    ApiError::remote(status.as_u16(), message)
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = json.get("message").and_then(|v| v.as_str())
    {
        return message.to_string();
    }
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_message_prefers_json_message() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"name is invalid"}"#);
        assert_eq!(msg, "name is invalid");
    }

    #[test]
    fn test_error_message_falls_back_to_body_or_reason() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(error_message(StatusCode::FORBIDDEN, ""), "Forbidden");
    }

    #[test]
    fn test_legacy_not_found_message_maps_to_not_found() {
        let err = error_from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"Managed identity with ID mi-9 not found"}"#,
        );
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = error_from_response(StatusCode::CONFLICT, r#"{"message":"already exists"}"#);
        assert!(matches!(err, ApiError::Remote { status: 409, .. }));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HttpClient::new("https://tharsis.example.com/", None).unwrap();
        assert_eq!(client.base_url(), "https://tharsis.example.com");
        assert_eq!(
            client.api_url("managed-identities/x"),
            "https://tharsis.example.com/v1/managed-identities/x"
        );
    }
}
