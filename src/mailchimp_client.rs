use crate::errors::AppError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

/// Remote resource operations the member service needs from the vendor.
///
/// Paths are relative to the API root (`lists/{id}/members`). Every transport
/// or HTTP-level failure is reported as [`AppError::RemoteError`].
#[async_trait]
pub trait RemoteResources: Send + Sync {
    async fn create_resource(&self, path: &str, payload: &Value) -> Result<Value, AppError>;

    async fn patch_resource(&self, path: &str, payload: &Value) -> Result<Value, AppError>;

    async fn get_resource(&self, path: &str) -> Result<Value, AppError>;

    async fn delete_resource(&self, path: &str) -> Result<(), AppError>;
}

pub fn members_path(list_id: &str) -> String {
    format!("lists/{}/members", list_id)
}

pub fn member_path(list_id: &str, subscriber_hash: &str) -> String {
    format!("lists/{}/members/{}", list_id, subscriber_hash)
}

/// Client for the MailChimp Marketing API (v3).
#[derive(Clone)]
pub struct MailChimpClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MailChimpClient {
    /// Creates a new `MailChimpClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API root, e.g. `https://us6.api.mailchimp.com/3.0`.
    /// * `api_key` - The API key, sent as HTTP basic auth password.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::RemoteError(format!("Failed to create MailChimp client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, AppError> {
        let url = self.url(path);
        tracing::debug!("MailChimp {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth("apikey", Some(&self.api_key));
        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::RemoteError(format!("MailChimp request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::RemoteError(format!("Failed to read MailChimp response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("MailChimp {} {} returned {}", method, path, status);
            return Err(AppError::RemoteError(problem_message(status, &text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&text).map_err(|e| {
            AppError::RemoteError(format!("Failed to parse MailChimp response: {}", e))
        })
    }
}

/// Extracts the human-readable part of a MailChimp problem document.
fn problem_message(status: reqwest::StatusCode, body: &str) -> String {
    let problem: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        problem
            .as_ref()
            .and_then(|p| p.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    field("detail")
        .or_else(|| field("title"))
        .unwrap_or_else(|| format!("MailChimp returned {}: {}", status, body))
}

#[async_trait]
impl RemoteResources for MailChimpClient {
    async fn create_resource(&self, path: &str, payload: &Value) -> Result<Value, AppError> {
        self.send(Method::POST, path, Some(payload)).await
    }

    async fn patch_resource(&self, path: &str, payload: &Value) -> Result<Value, AppError> {
        self.send(Method::PATCH, path, Some(payload)).await
    }

    async fn get_resource(&self, path: &str) -> Result<Value, AppError> {
        self.send(Method::GET, path, None).await
    }

    async fn delete_resource(&self, path: &str) -> Result<(), AppError> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }
}
