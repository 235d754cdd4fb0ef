//! In-memory stand-in for the campus dashboard REST API.
//!
//! Every collection answers the same five routes under `/api`:
//! list, create, update, delete and toggle. Responses use the
//! `{success, data, message}` envelope.

pub mod routes;
pub mod state;

use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, RESOURCES};

/// Build the `/api` router over `state`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = RESOURCES.iter().fold(Router::new(), |api, &resource| {
        api.merge(routes::resource::router(state.clone(), resource))
    });

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state,
            routes::injected_failures,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
