//! HTTP implementation of [`RemoteResourceClient`].
//!
//! Every endpoint answers with the envelope
//! `{ "success": bool, "data"?: ..., "message"?: string }`.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::client::{Draft, Filters, RemoteResourceClient};
use crate::error::{ResourceError, Result};
use crate::record::{Record, RecordId, RecordPatch};

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Client for one collection endpoint, e.g. `/faculty`.
pub struct HttpResourceClient<R> {
    http: reqwest::Client,
    base_url: String,
    path: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for HttpResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> HttpResourceClient<R> {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, path)
    }

    /// Share a connection pool between several resource clients.
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let path = path.into();
        let path = format!("/{}", path.trim_matches('/'));
        Self {
            http,
            base_url,
            path,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn collection_url(&self) -> Result<Url> {
        let url = format!("{}{}", self.base_url, self.path);
        Url::parse(&url).map_err(|e| ResourceError::Network(format!("invalid URL {}: {}", url, e)))
    }

    /// `{collection}/{id}` followed by `segments`, each escaped as one path segment.
    fn record_url(&self, id: &RecordId, segments: &[&str]) -> Result<Url> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| ResourceError::Network(format!("{} cannot carry a path", self.base_url)))?
            .push(&id.to_string())
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Sending request");
        self.http.request(method, url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status, bytes = body.len(), "Received response");
        interpret(status, &body)
    }
}

/// Attach a draft as JSON, or as multipart form data when it carries a file.
fn with_body(request: RequestBuilder, draft: &Draft) -> Result<RequestBuilder> {
    let Some(attachment) = &draft.attachment else {
        return Ok(request.json(&draft.fields));
    };

    let mut form = Form::new();
    for (key, value) in &draft.fields {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        form = form.text(key.clone(), text);
    }
    let part = Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.content_type)
        .map_err(|e| ResourceError::Decode(format!("invalid attachment content type: {}", e)))?;
    Ok(request.multipart(form.part("file", part)))
}

fn transport_error(err: reqwest::Error) -> ResourceError {
    if err.is_timeout() {
        ResourceError::Network("request timed out".to_string())
    } else if err.is_decode() {
        ResourceError::Decode(err.to_string())
    } else {
        ResourceError::Network(err.to_string())
    }
}

/// Translate a status code and envelope body into data or an error.
pub(crate) fn interpret<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Option<T>> {
    let envelope = serde_json::from_slice::<Envelope<Value>>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.trim().is_empty());

    match status {
        404 => {
            return Err(ResourceError::NotFound(
                message.unwrap_or_else(|| "record not found".to_string()),
            ));
        }
        400..=499 => {
            return Err(match message {
                Some(message) => ResourceError::Validation(message),
                None => ResourceError::Server {
                    status,
                    message: String::new(),
                },
            });
        }
        200..=299 => {}
        _ => {
            return Err(ResourceError::Server {
                status,
                message: message.unwrap_or_default(),
            });
        }
    }

    let envelope = envelope.ok_or_else(|| {
        ResourceError::Decode("response is not a valid envelope".to_string())
    })?;
    if !envelope.success {
        return Err(match message {
            Some(message) => ResourceError::Validation(message),
            None => ResourceError::Server {
                status,
                message: String::new(),
            },
        });
    }

    match envelope.data {
        None | Some(Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(|e| ResourceError::Decode(e.to_string())),
    }
}

fn require<T>(data: Option<T>, what: &str) -> Result<T> {
    data.ok_or_else(|| ResourceError::Decode(format!("{} response carried no data", what)))
}

#[async_trait]
impl<R: Record> RemoteResourceClient<R> for HttpResourceClient<R> {
    async fn list(&self, filters: &Filters) -> Result<Vec<R>> {
        let mut request = self.request(Method::GET, self.collection_url()?);
        if !filters.is_empty() {
            request = request.query(filters.pairs());
        }
        require(self.send(request).await?, "list")
    }

    async fn create(&self, input: &Draft) -> Result<R> {
        let request = with_body(self.request(Method::POST, self.collection_url()?), input)?;
        require(self.send(request).await?, "create")
    }

    async fn update(&self, id: &RecordId, input: &Draft) -> Result<R> {
        let request = with_body(self.request(Method::PUT, self.record_url(id, &[])?), input)?;
        require(self.send(request).await?, "update")
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let request = self.request(Method::DELETE, self.record_url(id, &[])?);
        self.send::<Value>(request).await?;
        Ok(())
    }

    async fn toggle(&self, id: &RecordId, field: &str) -> Result<RecordPatch> {
        let url = self.record_url(id, &["toggle", field])?;
        let request = self.request(Method::PATCH, url);
        require(self.send(request).await?, "toggle")
    }
}
