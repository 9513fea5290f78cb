//! Policy service client
//!
//! Creates and deletes tenant-scoped access policies over the policy
//! REST API:
//!
//! - `POST   /v2/{tenant}/policies`       → `201 Created` with `{"id": ...}`
//! - `DELETE /v2/{tenant}/policies/{id}`  → `204 No Content`
//!
//! Each call uses a fresh, unpooled blocking client and basic credentials.
//! Nothing is retried; any other status is a request failure.

use crate::error::{Result, RowguardError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

/// Media type the policy service speaks
pub const CONTENT_TYPE_SERVER: &str = "application/json";

/// Non-standard accept header the policy service expects
pub const HEADER_ACCEPTS: &str = "Accepts";

/// Connection settings for the policy service
#[derive(Clone, Deserialize)]
pub struct PolicyServiceConfig {
    /// Base API URL (e.g. `https://api.example.com`)
    pub url: String,
    pub tenant_id: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for PolicyServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyServiceConfig")
            .field("url", &self.url)
            .field("tenant_id", &self.tenant_id)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct PolicyCreated {
    id: String,
}

/// Blocking client for the policy REST API
pub struct PolicyService {
    base_url: Url,
    tenant_id: String,
    user: String,
    password: String,
}

impl std::fmt::Debug for PolicyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyService")
            .field("base_url", &self.base_url.as_str())
            .field("tenant_id", &self.tenant_id)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl PolicyService {
    pub fn new(config: PolicyServiceConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.url)?;
        if config.tenant_id.is_empty() {
            return Err(RowguardError::Config("policy service tenant_id is empty".into()));
        }
        Ok(Self {
            base_url,
            tenant_id: config.tenant_id,
            user: config.user,
            password: config.password,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Create a policy from its JSON document, returning the server-assigned id
    pub fn add_policy(&self, policy_json: &[u8]) -> Result<String> {
        let url = self.resource(None)?;
        let response = http_client()?
            .post(url.clone())
            .header(AUTHORIZATION, self.authorization())
            .header(CONTENT_TYPE, CONTENT_TYPE_SERVER)
            .header(HEADER_ACCEPTS, CONTENT_TYPE_SERVER)
            .body(policy_json.to_vec())
            .send()
            .map_err(|e| request_failed("POST", &url, e))?;

        let response = expect_status(response, StatusCode::CREATED, "POST", &url)?;
        let created: PolicyCreated = response.json().map_err(|e| {
            RowguardError::Request(format!("POST {}: unrecognized response: {}", url, e))
        })?;

        tracing::info!(tenant = %self.tenant_id, policy_id = %created.id, "Policy created");
        Ok(created.id)
    }

    /// Delete a policy by id
    pub fn delete_policy(&self, policy_id: &str) -> Result<()> {
        let url = self.resource(Some(policy_id))?;
        let response = http_client()?
            .delete(url.clone())
            .header(AUTHORIZATION, self.authorization())
            .header(HEADER_ACCEPTS, CONTENT_TYPE_SERVER)
            .send()
            .map_err(|e| request_failed("DELETE", &url, e))?;

        expect_status(response, StatusCode::NO_CONTENT, "DELETE", &url)?;

        tracing::info!(tenant = %self.tenant_id, policy_id = %policy_id, "Policy deleted");
        Ok(())
    }

    /// `Basic base64(user:password)`
    pub fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.password);
        format!("Basic {}", BASE64.encode(credentials))
    }

    /// Tenant policy collection, or one policy within it
    fn resource(&self, policy_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                RowguardError::Config(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .push("v2")
                .push(&self.tenant_id)
                .push("policies");
            if let Some(id) = policy_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| RowguardError::Config(format!("invalid policy service url '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RowguardError::Config(format!(
                "unsupported policy service scheme '{}'",
                other
            )))
        }
    }
    if url.cannot_be_a_base() {
        return Err(RowguardError::Config(format!("{} cannot be used as a base URL", raw)));
    }
    Ok(url)
}

fn http_client() -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .map_err(|e| RowguardError::Request(format!("Failed to build HTTP client: {}", e)))
}

fn request_failed(method: &str, url: &Url, err: reqwest::Error) -> RowguardError {
    tracing::warn!(method, url = %url, error = %err, "Policy request failed");
    RowguardError::Request(format!("{} {}: {}", method, url, err))
}

fn expect_status(
    response: Response,
    expected: StatusCode,
    method: &str,
    url: &Url,
) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::warn!(
        method,
        url = %url,
        status = status.as_u16(),
        expected = expected.as_u16(),
        "Unexpected policy service status"
    );
    Err(RowguardError::Request(format!(
        "{} {} returned {}, expected {}: {}",
        method, url, status, expected, body
    )))
}
