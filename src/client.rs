//! phpIPAM REST client
//!
//! Thin wrapper over reqwest that authenticates with the static `token`
//! header and hands back raw response bodies. The HTTP status is not
//! inspected: phpIPAM reports success through the `code` field of its JSON
//! envelope, which callers check.

use crate::config::Config;
use crate::models::ApiResponse;
use crate::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::debug;

/// Request payload
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// Pre-encoded `key=value&...` form body
    Form(String),
}

/// phpIPAM API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// `{scheme}://{server}/api/{appid}`
    base_url: String,
    token: String,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(&config.base_url(), &config.token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and return the body text.
    pub async fn call(&self, method: Method, path: &str, body: Body) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .header("token", &self.token);

        req = match body {
            Body::Empty => req,
            Body::Json(value) => req
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&value)?),
            Body::Form(form) => req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form),
        };

        let resp = req.send().await?;
        Ok(resp.text().await?)
    }

    /// Issue one request and decode the phpIPAM envelope.
    pub async fn envelope(&self, method: Method, path: &str, body: Body) -> Result<ApiResponse> {
        let text = self.call(method, path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.envelope(Method::GET, path, Body::Empty).await
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.envelope(Method::POST, path, Body::Json(body)).await
    }

    pub async fn post_form(&self, path: &str, form: String) -> Result<ApiResponse> {
        self.envelope(Method::POST, path, Body::Form(form)).await
    }

    pub async fn patch_form(&self, path: &str, form: String) -> Result<ApiResponse> {
        self.envelope(Method::PATCH, path, Body::Form(form)).await
    }
}
