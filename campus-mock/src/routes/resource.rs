//! Generic CRUD handlers shared by every collection endpoint.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, put},
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tracing::info;

use super::{ApiError, ApiResponse, Payload};
use crate::state::{AppState, Collection, Row, row_id};

#[derive(Clone)]
pub struct ResourceState {
    pub app: AppState,
    pub resource: &'static str,
}

/// Routes for one collection mounted at `resource`.
pub fn router(app: AppState, resource: &'static str) -> Router {
    Router::new()
        .route(resource, get(list).post(create))
        .route(&format!("{}/{{id}}", resource), put(update).delete(remove))
        .route(&format!("{}/{{id}}/toggle/{{field}}", resource), patch(toggle))
        .with_state(ResourceState { app, resource })
}

/// Field that names a row and must be present and unique.
pub fn label_field(resource: &str) -> &'static str {
    match resource {
        "/certificate" | "/job-post" | "/page" => "title",
        "/donation" => "donor_name",
        _ => "name",
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Row, filters: &HashMap<String, String>) -> bool {
    filters
        .iter()
        .all(|(key, wanted)| row.get(key).is_some_and(|v| text_of(v) == *wanted))
}

/// Reject a missing or blank label, or one that another row already uses.
fn validate_label(
    rows: &Collection,
    resource: &str,
    fields: &Map<String, Value>,
    except_id: Option<&str>,
    required: bool,
) -> Result<(), ApiError> {
    let field = label_field(resource);
    let label = match fields.get(field) {
        Some(value) => text_of(value),
        None if !required => return Ok(()),
        None => String::new(),
    };
    let label = label.trim();
    if label.is_empty() {
        return Err(ApiError::invalid(format!("The {} field is required.", field)));
    }
    if field != "donor_name" && rows.value_taken(field, label, except_id) {
        return Err(ApiError::invalid(format!(
            "The {} '{}' has already been taken.",
            field, label
        )));
    }
    Ok(())
}

pub async fn list(
    State(state): State<ResourceState>,
    Query(filters): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let inner = state.app.inner.read().await;
    let collection = inner
        .collections
        .get(state.resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource {}", state.resource)))?;
    let rows: Vec<Row> = collection
        .rows
        .iter()
        .filter(|row| matches(row, &filters))
        .cloned()
        .collect();
    Ok(ApiResponse::ok(rows))
}

pub async fn create(
    State(state): State<ResourceState>,
    Payload(mut fields): Payload,
) -> Result<impl IntoResponse, ApiError> {
    let mut inner = state.app.inner.write().await;
    let collection = inner
        .collections
        .get_mut(state.resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource {}", state.resource)))?;

    validate_label(collection, state.resource, &fields, None, true)?;

    fields.remove("id");
    match label_field(state.resource) {
        "title" => {
            fields.entry("status").or_insert_with(|| json!("draft"));
        }
        "name" => {
            fields.entry("active").or_insert(json!(true));
        }
        _ => {}
    }
    fields.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));

    let row = collection.insert(fields);
    info!(resource = state.resource, id = ?row_id(&row), "Created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(row, "Created successfully"),
    ))
}

pub async fn update(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    Payload(fields): Payload,
) -> Result<impl IntoResponse, ApiError> {
    let mut inner = state.app.inner.write().await;
    let collection = inner
        .collections
        .get_mut(state.resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource {}", state.resource)))?;
    let index = collection
        .position(&id)
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found", id)))?;

    validate_label(collection, state.resource, &fields, Some(&id), false)?;

    let row = &mut collection.rows[index];
    for (key, value) in fields {
        if key != "id" {
            row.insert(key, value);
        }
    }
    row.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    info!(resource = state.resource, id = %id, "Updated");
    Ok(ApiResponse::with_message(row.clone(), "Updated successfully"))
}

pub async fn remove(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut inner = state.app.inner.write().await;
    let collection = inner
        .collections
        .get_mut(state.resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource {}", state.resource)))?;
    let index = collection
        .position(&id)
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found", id)))?;
    collection.rows.remove(index);

    info!(resource = state.resource, id = %id, "Deleted");
    Ok(Json(ApiResponse::<Value> {
        success: true,
        data: None,
        message: Some("Deleted successfully".to_string()),
    }))
}

fn flipped(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(!b)),
        Value::Number(n) if n.as_i64() == Some(0) => Some(json!(1)),
        Value::Number(n) if n.as_i64() == Some(1) => Some(json!(0)),
        Value::String(s) => match s.as_str() {
            "published" => Some(json!("draft")),
            "draft" => Some(json!("published")),
            "active" => Some(json!("inactive")),
            "inactive" => Some(json!("active")),
            _ => None,
        },
        _ => None,
    }
}

pub async fn toggle(
    State(state): State<ResourceState>,
    Path((id, field)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut inner = state.app.inner.write().await;
    let collection = inner
        .collections
        .get_mut(state.resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource {}", state.resource)))?;
    let index = collection
        .position(&id)
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found", id)))?;

    let row = &mut collection.rows[index];
    let next = row
        .get(&field)
        .and_then(flipped)
        .ok_or_else(|| ApiError::invalid(format!("The {} field cannot be toggled.", field)))?;
    row.insert(field.clone(), next.clone());

    let mut patch = Map::new();
    if let Some(row_id) = row.get("id") {
        patch.insert("id".to_string(), row_id.clone());
    }
    patch.insert(field.clone(), next);

    info!(resource = state.resource, id = %id, field = %field, "Toggled");
    Ok(ApiResponse::with_message(patch, "Status updated"))
}
