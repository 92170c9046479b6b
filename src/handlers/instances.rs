//! Instance endpoints: listing, detail, creation, update, deletion, and
//! lifecycle actions.
//!
//! Action requests arrive as one JSON payload on a single endpoint and fan
//! out to per-action provider endpoints; see [`crate::validation`] for the
//! accepted shapes.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::Value;
use tracing::instrument;

use crate::credentials::Credentials;
use crate::error::AppResult;
use crate::models::{CreateInstanceRequest, Envelope, Instance, ListInstancesQuery};
use crate::state::AppState;
use crate::validation::{
    parse_instance_action, validate_create_instance, validate_page, validate_resource_id,
};

/// List instances, one page at a time.
#[instrument(skip(state, credentials))]
pub async fn list_instances(
    State(state): State<AppState>,
    credentials: Credentials,
    Query(query): Query<ListInstancesQuery>,
) -> AppResult<Json<Envelope<Vec<Instance>>>> {
    // The provider paginates 1-indexed; an absent parameter means page 1
    let page = query.page.unwrap_or(1);
    validate_page(page)?;

    let client = state.client_for(credentials);
    let envelope = client.list_instances(page).await?;

    Ok(Json(envelope))
}

/// Get a specific instance by ID.
#[instrument(skip(state, credentials))]
pub async fn get_instance(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<Vec<Instance>>>> {
    // Validate path parameter before it reaches the signed path
    validate_resource_id(&id, "Instance")?;

    let client = state.client_for(credentials);
    let envelope = client.get_instance(&id).await?;

    Ok(Json(envelope))
}

/// Create a new instance.
#[instrument(skip(state, credentials, payload))]
pub async fn create_instance(
    State(state): State<AppState>,
    credentials: Credentials,
    Json(payload): Json<CreateInstanceRequest>,
) -> AppResult<Json<Envelope<Vec<Instance>>>> {
    validate_create_instance(&payload)?;

    let client = state.client_for(credentials);
    let envelope = client.create_instance(&payload).await?;

    Ok(Json(envelope))
}

/// Update an instance. The payload is relayed to the provider unchanged.
#[instrument(skip(state, credentials, payload))]
pub async fn update_instance(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Envelope<Vec<Instance>>>> {
    validate_resource_id(&id, "Instance")?;

    let client = state.client_for(credentials);
    let envelope = client.update_instance(&id, payload).await?;

    Ok(Json(envelope))
}

/// Delete an instance.
#[instrument(skip(state, credentials))]
pub async fn delete_instance(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<Value>>> {
    validate_resource_id(&id, "Instance")?;

    let client = state.client_for(credentials);
    let envelope = client.delete_instance(&id).await?;

    Ok(Json(envelope))
}

/// Run a lifecycle action (start, shutdown, reboot, rebuild, resize).
#[instrument(skip(state, credentials, payload))]
pub async fn instance_action(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Envelope<Value>>> {
    validate_resource_id(&id, "Instance")?;
    let action = parse_instance_action(&payload)?;

    let client = state.client_for(credentials);
    let envelope = client.instance_action(&id, &action).await?;

    Ok(Json(envelope))
}
