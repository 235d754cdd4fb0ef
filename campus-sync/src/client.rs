//! Remote resource client abstraction.
//!
//! The controller only ever talks to a collection endpoint through this
//! trait, so views can be driven by the HTTP client in production and by a
//! scripted client in tests.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{ResourceError, Result};
use crate::record::{Record, RecordId, RecordPatch};

// =============================================================================
// Request DTOs
// =============================================================================

/// Exact-match query filters for a list request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Binary file sent alongside a draft. Forwarded to the server untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Payload for create and update requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub fields: Map<String, Value>,
    pub attachment: Option<Attachment>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a draft from any serializable form type.
    pub fn from_serialize<T: Serialize>(form: &T) -> Result<Self> {
        match serde_json::to_value(form) {
            Ok(Value::Object(fields)) => Ok(Self {
                fields,
                attachment: None,
            }),
            Ok(_) => Err(ResourceError::Decode(
                "form does not serialize to an object".to_string(),
            )),
            Err(e) => Err(ResourceError::Decode(e.to_string())),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Send the draft as multipart form data with `attachment` as the `file`
    /// part. Every field is flattened to a text part: strings as-is, null as
    /// empty, anything else as its JSON text.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

impl From<Map<String, Value>> for Draft {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            attachment: None,
        }
    }
}

// =============================================================================
// Client Trait
// =============================================================================

/// Client for one collection endpoint.
#[async_trait]
pub trait RemoteResourceClient<R: Record>: Send + Sync {
    /// List the collection, in server order.
    async fn list(&self, filters: &Filters) -> Result<Vec<R>>;

    /// Create a record. Returns the stored record with its server-assigned id.
    async fn create(&self, input: &Draft) -> Result<R>;

    /// Update a record. Returns the stored record.
    async fn update(&self, id: &RecordId, input: &Draft) -> Result<R>;

    /// Delete a record.
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Flip a field server-side. Returns the fields the server changed.
    async fn toggle(&self, id: &RecordId, field: &str) -> Result<RecordPatch>;
}

#[async_trait]
impl<R: Record, T: RemoteResourceClient<R> + ?Sized> RemoteResourceClient<R> for Arc<T> {
    async fn list(&self, filters: &Filters) -> Result<Vec<R>> {
        (**self).list(filters).await
    }

    async fn create(&self, input: &Draft) -> Result<R> {
        (**self).create(input).await
    }

    async fn update(&self, id: &RecordId, input: &Draft) -> Result<R> {
        (**self).update(id, input).await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn toggle(&self, id: &RecordId, field: &str) -> Result<RecordPatch> {
        (**self).toggle(id, field).await
    }
}
