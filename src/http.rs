use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::store::{keys, LocalStore};

/// Errors internal to the transport layer. The endpoint resolver treats all
/// of them the same way: skip to the next candidate.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// One outgoing request against the backend
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, path: path.into(), body: Some(body) }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::PUT, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::DELETE, path: path.into(), body: None }
    }
}

/// Multipart upload attached to an existing listing. The image field name
/// varies across backend versions, so callers try several aliases.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub car_id: i64,
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Seam between the services and the wire, so the whole service layer can
/// run against a scripted transport in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, req: &ApiRequest) -> std::result::Result<Value, HttpError>;

    async fn upload(&self, path: &str, form: UploadForm) -> std::result::Result<Value, HttpError>;
}

/// Trim whitespace and trailing slashes, and collapse duplicate slashes
/// while preserving the `protocol://` prefix.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let (proto, rest) = match trimmed.find("://") {
        Some(idx) => trimmed.split_at(idx + 3),
        None => ("", trimmed),
    };

    let mut collapsed = String::with_capacity(rest.len());
    let mut prev_slash = false;
    for ch in rest.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(ch);
    }

    format!("{proto}{collapsed}")
}

/// Join a request path onto the base URL, guarding against duplicated `/api`
/// segments when the base already ends with `/api`.
pub fn join_url(base: &str, path: &str) -> String {
    let mut path = path.to_string();
    if base.ends_with("/api") && path.starts_with("/api") {
        path = path["/api".len()..].to_string();
    }
    while path.starts_with("//") {
        path.remove(0);
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    format!("{base}{path}")
}

/// Pull a bearer token out of a persisted session record, tolerating the
/// property names used by different client versions.
pub fn bearer_token(session: &Value) -> Option<String> {
    for key in ["token", "api_token", "apiToken"] {
        if let Some(token) = session.get(key).and_then(Value::as_str) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    session
        .get("auth")
        .and_then(|auth| auth.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// reqwest-backed transport. Reads the persisted session before every
/// request and attaches an `Authorization: Bearer` header when a token is
/// present, mirroring a request interceptor.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    store: Arc<LocalStore>,
}

impl HttpTransport {
    pub fn new(base_url: &str, store: Arc<LocalStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            store,
        })
    }

    fn token(&self) -> Option<String> {
        let session = self.store.get_raw(keys::SESSION)?;
        bearer_token(&session)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, req: &ApiRequest) -> std::result::Result<Value, HttpError> {
        let url = join_url(&self.base_url, &req.path);
        debug!("{} {}", req.method, url);

        let mut builder = self.client.request(req.method.clone(), &url);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn upload(&self, path: &str, form: UploadForm) -> std::result::Result<Value, HttpError> {
        let url = join_url(&self.base_url, path);
        debug!("POST {} (multipart, field '{}')", url, form.field);

        let part = multipart::Part::bytes(form.bytes).file_name(form.filename);
        let multipart = multipart::Form::new()
            .text("car_id", form.car_id.to_string())
            .part(form.field, part);

        let mut builder = self.client.post(&url).multipart(multipart);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}
