//! Cloneable handle for driving one controller from several tasks.
//!
//! Overlapping `load()` calls are ignored: while a load is running or
//! queued, further loads return [`LoadOutcome::AlreadyInFlight`] without
//! contacting the server. Mutations wait for the controller and run in
//! arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{Draft, RemoteResourceClient};
use crate::controller::ResourceListController;
use crate::error::Result;
use crate::record::{Record, RecordId};
use crate::state::ListState;

/// Result of a shared `load()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Another load was already running; this call did nothing.
    AlreadyInFlight,
}

pub struct SharedController<R: Record, C: RemoteResourceClient<R>> {
    inner: Arc<Mutex<ResourceListController<R, C>>>,
    load_pending: Arc<AtomicBool>,
    state_rx: watch::Receiver<ListState<R>>,
    teardown: CancellationToken,
}

impl<R: Record, C: RemoteResourceClient<R>> Clone for SharedController<R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            load_pending: Arc::clone(&self.load_pending),
            state_rx: self.state_rx.clone(),
            teardown: self.teardown.clone(),
        }
    }
}

/// Clears the pending-load flag however the load ends.
struct PendingLoad<'a>(&'a AtomicBool);

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: Record, C: RemoteResourceClient<R>> SharedController<R, C> {
    pub fn new(controller: ResourceListController<R, C>) -> Self {
        let state_rx = controller.subscribe();
        let teardown = controller.teardown_token();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            load_pending: Arc::new(AtomicBool::new(false)),
            state_rx,
            teardown,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<R>> {
        self.state_rx.clone()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ListState<R> {
        self.state_rx.borrow().clone()
    }

    pub fn teardown_token(&self) -> CancellationToken {
        self.teardown.clone()
    }

    pub async fn load(&self) -> Result<LoadOutcome> {
        if self
            .load_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Load already in flight, ignoring");
            return Ok(LoadOutcome::AlreadyInFlight);
        }
        let _pending = PendingLoad(&self.load_pending);

        let mut controller = self.inner.lock().await;
        controller.load().await?;
        Ok(LoadOutcome::Loaded)
    }

    pub async fn create(&self, input: &Draft) -> Result<R> {
        self.inner.lock().await.create(input).await
    }

    pub async fn update(&self, id: &RecordId, input: &Draft) -> Result<R> {
        self.inner.lock().await.update(id, input).await
    }

    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        self.inner.lock().await.remove(id).await
    }

    pub async fn toggle_field(&self, id: &RecordId, field: &str) -> Result<Option<R>> {
        self.inner.lock().await.toggle_field(id, field).await
    }
}
