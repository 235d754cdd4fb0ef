//! ResourceListController driving the mock API end to end.

mod common;

use campus_sync::resources::{Department, Faculty, Page};
use campus_sync::{
    ControllerConfig, Draft, DynamicRecord, ErrorKind, Filters, HttpResourceClient, InsertPosition,
    OperationState, RecordId, ResourceKind, ResourceListController, RetryPolicy, SharedController,
};
use axum::{Json, Router, routing::get};
use common::TestServer;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_load_then_crud_keeps_list_in_sync() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<Faculty>(ResourceKind::Faculty);

    controller.load().await.unwrap();
    assert_eq!(controller.items().len(), 3);
    assert_eq!(controller.status(), &OperationState::Idle);

    let created = controller
        .create(&Draft::new().field("name", "Law"))
        .await
        .unwrap();
    assert_eq!(controller.items().last().map(|f| f.name.as_str()), Some("Law"));

    controller
        .update(&created.id, &Draft::new().field("code", "LAW"))
        .await
        .unwrap();
    assert_eq!(
        controller.get(&created.id).and_then(|f| f.code.as_deref()),
        Some("LAW")
    );

    controller.remove(&RecordId::Int(1)).await.unwrap();
    let names: Vec<&str> = controller.items().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Humanities", "Commerce", "Law"]);

    // Local list matches a fresh load.
    let mut fresh = server.controller::<Faculty>(ResourceKind::Faculty);
    fresh.load().await.unwrap();
    let fresh_names: Vec<&str> = fresh.items().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, fresh_names);

    server.shutdown();
}

#[tokio::test]
async fn test_toggle_merges_server_value() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<Page>(ResourceKind::Page);
    controller.load().await.unwrap();

    let toggled = controller
        .toggle_field(&RecordId::Int(2), "status")
        .await
        .unwrap()
        .expect("page 2 is loaded");
    assert_eq!(toggled.status, "published");
    assert_eq!(toggled.title, "Admissions");
    assert_eq!(controller.items()[1].status, "published");

    server.shutdown();
}

#[tokio::test]
async fn test_filters_apply_to_every_load() {
    let server = TestServer::spawn().await;
    let config = ControllerConfig {
        resource: "/department".to_string(),
        filters: Filters::new().with("faculty_id", "2"),
        ..ControllerConfig::default()
    };
    let mut controller: ResourceListController<Department, _> =
        ResourceListController::with_config(server.client(ResourceKind::Department), config);

    controller.load().await.unwrap();
    assert_eq!(controller.items().len(), 1);
    assert_eq!(controller.items()[0].name, "History");

    controller.set_filters(Filters::new().with("faculty_id", "1"));
    controller.load().await.unwrap();
    assert_eq!(controller.items().len(), 2);

    server.shutdown();
}

#[tokio::test]
async fn test_prepend_places_new_rows_first() {
    let server = TestServer::spawn().await;
    let config = ControllerConfig {
        insert_at: InsertPosition::Prepend,
        ..ControllerConfig::default()
    };
    let mut controller: ResourceListController<DynamicRecord, _> =
        ResourceListController::with_config(server.client(ResourceKind::SalaryType), config);
    controller.load().await.unwrap();

    controller
        .create(&Draft::new().field("name", "Medical").field("amount", 1500.0))
        .await
        .unwrap();
    assert_eq!(controller.items()[0].get("name"), Some(&json!("Medical")));
    assert_eq!(controller.items().len(), 3);

    server.shutdown();
}

#[tokio::test]
async fn test_validation_failure_leaves_list_untouched() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<Faculty>(ResourceKind::Faculty);
    controller.load().await.unwrap();
    let before = controller.snapshot().items;

    let err = controller
        .create(&Draft::new().field("name", "science"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let state = controller.snapshot();
    assert_eq!(state.items, before);
    let info = state.last_error.expect("error recorded");
    assert_eq!(info.message, "The name 'science' has already been taken.");
    assert!(matches!(state.status, OperationState::Error(_)));

    server.shutdown();
}

#[tokio::test]
async fn test_server_failure_then_recovery() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<Faculty>(ResourceKind::Faculty);
    controller.load().await.unwrap();

    server.state.fail_next(500, Some("stack trace here")).await;
    let err = controller.remove(&RecordId::Int(2)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server { status: 500 });
    assert_eq!(controller.items().len(), 3);
    // Internal server text is not shown to users.
    assert_eq!(
        controller.last_error().map(|e| e.message.as_str()),
        Some("The server could not complete the request. Please try again later.")
    );

    controller.remove(&RecordId::Int(2)).await.unwrap();
    assert_eq!(controller.items().len(), 2);
    assert!(controller.last_error().is_none());
    assert_eq!(controller.status(), &OperationState::Idle);

    server.shutdown();
}

#[tokio::test]
async fn test_deleted_elsewhere_reports_not_found() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<Faculty>(ResourceKind::Faculty);
    controller.load().await.unwrap();

    {
        let mut inner = server.state.inner.write().await;
        inner.collections.get_mut("/faculty").unwrap().rows.remove(0);
    }

    let err = controller
        .update(&RecordId::Int(1), &Draft::new().field("code", "X"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(controller.items().len(), 3);

    server.shutdown();
}

#[tokio::test]
async fn test_text_ids_cannot_reach_other_records() {
    let server = TestServer::spawn().await;
    let mut controller = server.controller::<DynamicRecord>(ResourceKind::Faculty);
    controller.load().await.unwrap();

    let id = RecordId::Str("1?x=y".to_string());
    let err = controller
        .update(&id, &Draft::new().field("code", "HIJACK"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = controller
        .toggle_field(&RecordId::Str("1/toggle/active?".to_string()), "active")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = controller
        .remove(&RecordId::Str("1#".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let rows = server.state.rows("/faculty").await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["code"], json!("SCI"));
    assert_eq!(rows[0]["active"], json!(true));
    assert_eq!(controller.items().len(), 3);

    server.shutdown();
}

#[tokio::test]
async fn test_list_without_data_keeps_previous_items() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new().route(
        "/api/faculty",
        get(move || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Json(json!({"success": true, "data": [{"id": 1, "name": "Science"}]}))
                } else {
                    Json(json!({"success": true}))
                }
            }
        }),
    );
    let server = TestServer::spawn_router(router).await;
    let mut controller = server.controller::<DynamicRecord>(ResourceKind::Faculty);

    controller.load().await.unwrap();
    assert_eq!(controller.items().len(), 1);

    let err = controller.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server { status: 200 });
    assert_eq!(controller.items().len(), 1);
    assert!(matches!(controller.status(), OperationState::Error(_)));
    assert!(controller.last_error().is_some());

    server.shutdown();
}

#[tokio::test]
async fn test_opt_in_retry_recovers_from_transient_failure() {
    let server = TestServer::spawn().await;
    let config = ControllerConfig {
        retry: RetryPolicy::transient(2, Duration::from_millis(10)),
        ..ControllerConfig::default()
    };
    let mut controller: ResourceListController<Faculty, _> =
        ResourceListController::with_config(server.client(ResourceKind::Faculty), config);

    server.state.fail_next(502, None).await;
    controller.load().await.unwrap();
    assert_eq!(controller.items().len(), 3);

    server.shutdown();
}

#[tokio::test]
async fn test_unreachable_server_sets_network_error() {
    let client: HttpResourceClient<Faculty> =
        HttpResourceClient::new(common::closed_base_url().await, ResourceKind::Faculty.path());
    let mut controller = ResourceListController::new(client);

    let err = controller.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(controller.items().is_empty());
    assert_eq!(
        controller.last_error().map(|e| e.kind),
        Some(ErrorKind::Network)
    );
}

#[tokio::test]
async fn test_shared_handle_over_http() {
    let server = TestServer::spawn().await;
    let shared = SharedController::new(server.controller::<Faculty>(ResourceKind::Faculty));
    let mut updates = shared.subscribe();

    shared.load().await.unwrap();
    let other = shared.clone();
    other
        .create(&Draft::new().field("name", "Medicine"))
        .await
        .unwrap();

    updates.changed().await.unwrap();
    let state = shared.snapshot();
    assert_eq!(state.items.len(), 4);
    assert_eq!(state.status, OperationState::Idle);

    server.shutdown();
}
