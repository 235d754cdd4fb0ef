//! List controller: owns one remote collection and keeps it in sync.
//!
//! Every mutating method takes `&mut self`, so a controller has at most one
//! request in flight. Views observe it through [`ResourceListController::subscribe`]
//! and never write to the collection directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{Draft, Filters, RemoteResourceClient};
use crate::error::{ErrorInfo, ResourceError, Result};
use crate::reconcile::{self, Change, InsertPosition};
use crate::record::{Record, RecordId};
use crate::state::{ListState, OperationState};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry behaviour for transient failures.
///
/// The default is a single attempt. Only errors for which
/// [`ResourceError::is_transient`] holds are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn transient(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Label used in log lines, usually the endpoint path.
    pub resource: String,
    /// Filters sent with every `load()`.
    pub filters: Filters,
    /// Per-request deadline. `None` waits forever.
    pub timeout: Option<Duration>,
    pub insert_at: InsertPosition,
    pub retry: RetryPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resource: "records".to_string(),
            filters: Filters::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            insert_at: InsertPosition::Append,
            retry: RetryPolicy::default(),
        }
    }
}

/// Mediates between a view and a [`RemoteResourceClient`] for one collection.
pub struct ResourceListController<R: Record, C: RemoteResourceClient<R>> {
    client: C,
    config: ControllerConfig,
    items: Arc<Vec<R>>,
    status: OperationState,
    last_error: Option<ErrorInfo>,
    state_tx: watch::Sender<ListState<R>>,
    teardown: CancellationToken,
}

impl<R: Record, C: RemoteResourceClient<R>> ResourceListController<R, C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, ControllerConfig::default())
    }

    pub fn with_config(client: C, config: ControllerConfig) -> Self {
        let (state_tx, _) = watch::channel(ListState::default());
        Self {
            client,
            config,
            items: Arc::new(Vec::new()),
            status: OperationState::Idle,
            last_error: None,
            state_tx,
            teardown: CancellationToken::new(),
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn status(&self) -> &OperationState {
        &self.status
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        reconcile::position(&self.items, id).map(|index| &self.items[index])
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn filters(&self) -> &Filters {
        &self.config.filters
    }

    /// Filters applied by the next `load()`.
    pub fn set_filters(&mut self, filters: Filters) {
        self.config.filters = filters;
    }

    /// Current state as a cheap snapshot.
    pub fn snapshot(&self) -> ListState<R> {
        ListState {
            items: Arc::clone(&self.items),
            status: self.status.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Receive a snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ListState<R>> {
        self.state_tx.subscribe()
    }

    /// Token the owning view cancels when it goes away.
    ///
    /// Cancelling aborts the request in flight and republishes the status it
    /// replaced, without recording an error. Every later call fails with
    /// [`ResourceError::Cancelled`] without reaching the server.
    pub fn teardown_token(&self) -> CancellationToken {
        self.teardown.clone()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetch the collection and replace the local copy wholesale.
    pub async fn load(&mut self) -> Result<()> {
        let previous = self.begin(OperationState::Loading)?;
        let filters = self.config.filters.clone();
        debug!(resource = %self.config.resource, filters = ?filters.pairs(), "Loading collection");

        let result = self.call("list", || self.client.list(&filters)).await;
        match result {
            Ok(items) => {
                info!(resource = %self.config.resource, count = items.len(), "Collection loaded");
                self.items = Arc::new(items);
                self.succeed();
                Ok(())
            }
            Err(e) => Err(self.fail("list", previous, e)),
        }
    }

    /// Create a record and add the server's copy to the collection.
    pub async fn create(&mut self, input: &Draft) -> Result<R> {
        let previous = self.begin(OperationState::Submitting)?;
        debug!(resource = %self.config.resource, "Creating record");

        let result = self.call("create", || self.client.create(input)).await;
        match result {
            Ok(record) => {
                let change = reconcile::insert(
                    Arc::make_mut(&mut self.items),
                    record.clone(),
                    self.config.insert_at,
                );
                info!(resource = %self.config.resource, id = %record.id(), ?change, "Record created");
                self.succeed();
                Ok(record)
            }
            Err(e) => Err(self.fail("create", previous, e)),
        }
    }

    /// Update a record and replace the local copy with the server's.
    ///
    /// If the record is no longer held locally, the returned record is
    /// appended.
    pub async fn update(&mut self, id: &RecordId, input: &Draft) -> Result<R> {
        let previous = self.begin(OperationState::Submitting)?;
        debug!(resource = %self.config.resource, %id, "Updating record");

        let result = self.call("update", || self.client.update(id, input)).await;
        match result {
            Ok(record) => {
                if record.id() != *id {
                    warn!(
                        resource = %self.config.resource,
                        requested = %id,
                        returned = %record.id(),
                        "Server returned a different id for update"
                    );
                }
                let change = reconcile::upsert(Arc::make_mut(&mut self.items), record.clone());
                info!(resource = %self.config.resource, %id, ?change, "Record updated");
                self.succeed();
                Ok(record)
            }
            Err(e) => Err(self.fail("update", previous, e)),
        }
    }

    /// Delete a record. The caller is expected to have confirmed with the user.
    ///
    /// Deleting an id that is not held locally succeeds without changes.
    pub async fn remove(&mut self, id: &RecordId) -> Result<()> {
        let previous = self.begin(OperationState::Submitting)?;
        debug!(resource = %self.config.resource, %id, "Deleting record");

        let result = self.call("delete", || self.client.delete(id)).await;
        match result {
            Ok(()) => {
                let change = reconcile::remove(Arc::make_mut(&mut self.items), id);
                if change == Change::Unchanged {
                    debug!(resource = %self.config.resource, %id, "Deleted record was not held locally");
                }
                info!(resource = %self.config.resource, %id, "Record deleted");
                self.succeed();
                Ok(())
            }
            Err(e) => Err(self.fail("delete", previous, e)),
        }
    }

    /// Ask the server to flip `field` and merge the fields it reports back.
    ///
    /// Returns the merged record, or `None` if it is not held locally.
    pub async fn toggle_field(&mut self, id: &RecordId, field: &str) -> Result<Option<R>> {
        let previous = self.begin(OperationState::Submitting)?;
        debug!(resource = %self.config.resource, %id, field, "Toggling field");

        let result = self.call("toggle", || self.client.toggle(id, field)).await;
        let patch = match result {
            Ok(patch) => patch,
            Err(e) => return Err(self.fail("toggle", previous, e)),
        };

        if !patch.contains(field) {
            warn!(
                resource = %self.config.resource,
                %id,
                field,
                "Toggle response did not include the toggled field"
            );
        }

        // Merge into a copy so a bad patch leaves the collection untouched.
        let mut items = Vec::clone(&self.items);
        match reconcile::patch(&mut items, id, &patch) {
            Ok(change) => {
                let merged = match change {
                    Change::Replaced(index) => Some(items[index].clone()),
                    _ => None,
                };
                self.items = Arc::new(items);
                info!(resource = %self.config.resource, %id, field, ?change, "Field toggled");
                self.succeed();
                Ok(merged)
            }
            Err(e) => Err(self.fail("toggle", previous, e)),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Enter an in-flight state. Returns the state it replaced.
    fn begin(&mut self, status: OperationState) -> Result<OperationState> {
        if self.teardown.is_cancelled() {
            return Err(ResourceError::Cancelled);
        }
        let previous = std::mem::replace(&mut self.status, status);
        self.publish();
        Ok(previous)
    }

    fn succeed(&mut self) {
        self.status = OperationState::Idle;
        self.last_error = None;
        self.publish();
    }

    fn fail(&mut self, op: &'static str, previous: OperationState, err: ResourceError) -> ResourceError {
        if err == ResourceError::Cancelled {
            // Republish the prior status so receivers do not stay on the in-flight one.
            debug!(resource = %self.config.resource, op, "Operation cancelled by teardown");
            self.status = previous;
            self.publish();
            return err;
        }

        warn!(resource = %self.config.resource, op, error = %err, "Operation failed");
        let info = ErrorInfo::from(&err);
        self.status = OperationState::Error(info.clone());
        self.last_error = Some(info);
        self.publish();
        err
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    /// Run one client call under the configured deadline, teardown token and
    /// retry policy.
    async fn call<'a, T>(
        &'a self,
        op: &'static str,
        request: impl Fn() -> BoxFuture<'a, Result<T>>,
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.teardown.cancelled() => return Err(ResourceError::Cancelled),
                result = self.with_deadline(request()) => result,
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.config.retry.max_attempts => {
                    warn!(
                        resource = %self.config.resource,
                        op,
                        attempt,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = self.teardown.cancelled() => return Err(ResourceError::Cancelled),
                        _ = tokio::time::sleep(self.config.retry.backoff) => {}
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn with_deadline<T>(&self, request: BoxFuture<'_, Result<T>>) -> Result<T> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or_else(|_| Err(ResourceError::Timeout(limit))),
            None => request.await,
        }
    }
}
