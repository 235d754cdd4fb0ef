//! List/form synchronization for campus dashboard resources.
//!
//! A [`ResourceListController`] owns one remote collection (teachers,
//! faculties, donation categories, ...) and keeps it consistent with the
//! server across load, create, update, delete and field toggles. It talks to
//! the server only through a [`RemoteResourceClient`]; [`HttpResourceClient`]
//! is the implementation used against the dashboard REST API.

pub mod client;
pub mod confirm;
pub mod controller;
pub mod error;
pub mod http;
pub mod reconcile;
pub mod record;
pub mod resources;
pub mod shared;
pub mod state;

pub use client::{Attachment, Draft, Filters, RemoteResourceClient};
pub use confirm::{AssumeNo, AssumeYes, ConfirmationGate};
pub use controller::{ControllerConfig, DEFAULT_TIMEOUT, ResourceListController, RetryPolicy};
pub use error::{ErrorInfo, ErrorKind, ResourceError};
pub use http::{Envelope, HttpResourceClient};
pub use reconcile::InsertPosition;
pub use record::{DynamicRecord, Record, RecordId, RecordPatch};
pub use resources::ResourceKind;
pub use shared::{LoadOutcome, SharedController};
pub use state::{ListState, OperationState};
