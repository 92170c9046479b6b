use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::credentials::Credentials;
use crate::error::AppResult;
use crate::models::{Envelope, Flavor};
use crate::state::AppState;
use crate::validation::validate_resource_id;

/// List available instance flavors.
#[instrument(skip(state, credentials))]
pub async fn list_flavors(
    State(state): State<AppState>,
    credentials: Credentials,
) -> AppResult<Json<Envelope<Vec<Flavor>>>> {
    let client = state.client_for(credentials);
    let envelope = client.list_flavors().await?;

    Ok(Json(envelope))
}

/// Get a specific flavor by ID.
#[instrument(skip(state, credentials))]
pub async fn get_flavor(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<Vec<Flavor>>>> {
    // Validate path parameter before it reaches the signed path
    validate_resource_id(&id, "Flavor")?;

    let client = state.client_for(credentials);
    let envelope = client.get_flavor(&id).await?;

    Ok(Json(envelope))
}
