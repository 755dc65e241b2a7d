//! Shelter cascade delete and per-shelter counts.

use crate::catalog::Resource;
use crate::error::AppError;
use crate::handlers::entity::parse_id;
use crate::response::success_one_ok;
use crate::service::shelters;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Shelters);
    let id = parse_id(&id_str)?;
    let removed = shelters::delete_shelter(&state.pool, entity, id).await?;
    Ok(success_one_ok(removed))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Shelters);
    let id = parse_id(&id_str)?;
    let stats = shelters::shelter_stats(&state.pool, entity, id).await?;
    Ok(success_one_ok(stats))
}
