//! Adopter delete, guarded by adoption records. Other adopter routes use the generic handlers.

use crate::catalog::Resource;
use crate::error::AppError;
use crate::handlers::entity::parse_id;
use crate::service::adopters;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, AppError> {
    let entity = state.catalog.entity(Resource::Adopters);
    let id = parse_id(&id_str)?;
    adopters::delete_adopter(&state.pool, entity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
