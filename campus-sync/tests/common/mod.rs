//! Shared test utilities for campus-sync integration tests.

#![allow(dead_code)]

use axum::Router;
use campus_mock::{AppState, create_router};
use campus_sync::{
    ControllerConfig, HttpResourceClient, Record, ResourceKind, ResourceListController,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Mock API served on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(AppState::new()).await
    }

    pub async fn spawn_with(state: AppState) -> Self {
        let router = create_router(state.clone());
        Self::serve(router, state).await
    }

    /// Serve a hand-built router instead of the mock API.
    pub async fn spawn_router(router: Router) -> Self {
        Self::serve(router, AppState::empty()).await
    }

    async fn serve(router: Router, state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client<R>(&self, kind: ResourceKind) -> HttpResourceClient<R> {
        HttpResourceClient::new(self.base_url(), kind.path())
    }

    /// Controller for `kind` with default settings.
    pub fn controller<R: Record>(
        &self,
        kind: ResourceKind,
    ) -> ResourceListController<R, HttpResourceClient<R>> {
        let config = ControllerConfig {
            resource: kind.path().to_string(),
            ..ControllerConfig::default()
        };
        ResourceListController::with_config(self.client(kind), config)
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// An address nothing listens on.
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
