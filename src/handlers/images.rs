use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::credentials::Credentials;
use crate::error::AppResult;
use crate::models::{Envelope, Image};
use crate::state::AppState;
use crate::validation::validate_resource_id;

/// List available OS images.
#[instrument(skip(state, credentials))]
pub async fn list_images(
    State(state): State<AppState>,
    credentials: Credentials,
) -> AppResult<Json<Envelope<Vec<Image>>>> {
    let client = state.client_for(credentials);
    let envelope = client.list_images().await?;

    Ok(Json(envelope))
}

/// Get a specific image by ID.
#[instrument(skip(state, credentials))]
pub async fn get_image(
    State(state): State<AppState>,
    credentials: Credentials,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<Vec<Image>>>> {
    // Validate path parameter before it reaches the signed path
    validate_resource_id(&id, "Image")?;

    let client = state.client_for(credentials);
    let envelope = client.get_image(&id).await?;

    Ok(Json(envelope))
}
