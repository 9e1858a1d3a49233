//! Shared JSON-over-HTTP plumbing for the upstream services.
//!
//! Every failure becomes a `RestClientError` tagged with the service name.
//! Requests are sent once; nothing here retries.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::RestClientError;

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    service: &'static str,
}

impl RestClient {
    pub fn new(service: &'static str, base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(service, base_url, client))
    }

    pub fn with_client(service: &'static str, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestClientError> {
        let req = self.client.get(self.url(path));
        self.send_json(reqwest::Method::GET, path, req).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RestClientError> {
        let req = self.client.post(self.url(path)).json(body);
        self.send_json(reqwest::Method::POST, path, req).await
    }

    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RestClientError> {
        let req = self.client.patch(self.url(path)).json(body);
        self.send_json(reqwest::Method::PATCH, path, req).await
    }

    /// Like `post_json` for endpoints that answer with an empty body.
    pub async fn post_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestClientError> {
        let req = self.client.post(self.url(path)).json(body);
        self.send(reqwest::Method::POST, path, req).await.map(|_| ())
    }

    pub async fn patch_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestClientError> {
        let req = self.client.patch(self.url(path)).json(body);
        self.send(reqwest::Method::PATCH, path, req).await.map(|_| ())
    }

    /// Send a prepared request (used by clients that need form bodies or auth).
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RestClientError> {
        let started = std::time::Instant::now();
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(service = self.service, %method, path, "request failed: {}", e);
            RestClientError {
                message: e.to_string(),
                service: self.service.to_string(),
                status: None,
                error_identifier: None,
            }
        })?;

        let status = resp.status();
        tracing::info!(
            service = self.service,
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream call"
        );

        if status.is_success() {
            return Ok(resp);
        }

        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        Err(RestClientError {
            message: error_message(&body)
                .unwrap_or_else(|| format!("{} {} failed", method, path)),
            service: self.service.to_string(),
            status: Some(status.as_u16()),
            error_identifier: body
                .get("error_identifier")
                .and_then(|v| v.as_str())
                .map(String::from),
        })
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, RestClientError> {
        let status_ok = self.send(method.clone(), path, req).await?;
        let status = status_ok.status().as_u16();
        status_ok.json::<T>().await.map_err(|e| RestClientError {
            message: format!("invalid response body for {} {}: {}", method, path, e),
            service: self.service.to_string(),
            status: Some(status),
            error_identifier: None,
        })
    }
}

/// Upstream error bodies come in a few shapes:
/// `{"message": ["..."]}`, `{"message": "..."}`, `{"errors": ["..."]}`,
/// Stripe's `{"error": {"message": "..."}}`.
fn error_message(body: &serde_json::Value) -> Option<String> {
    let candidate = body
        .get("message")
        .or_else(|| body.get("errors"))
        .or_else(|| body.get("error").and_then(|e| e.get("message")))?;
    match candidate {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}
