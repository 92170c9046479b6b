use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::credentials::Credentials;
use crate::error::AppResult;
use crate::models::{Envelope, Zone};
use crate::state::AppState;

/// List availability zones.
#[instrument(skip(state, credentials))]
pub async fn list_zones(
    State(state): State<AppState>,
    credentials: Credentials,
) -> AppResult<Json<Envelope<Vec<Zone>>>> {
    let client = state.client_for(credentials);
    let envelope = client.list_zones().await?;

    Ok(Json(envelope))
}
