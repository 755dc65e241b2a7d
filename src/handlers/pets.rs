//! Pet writes: status rules on create/update, adopted-pet guard on delete, image upload.

use crate::catalog::Resource;
use crate::error::AppError;
use crate::handlers::entity::{parse_id, validated_body};
use crate::handlers::upload::read_file_field;
use crate::response::{success_one, success_one_ok};
use crate::service::{pets, upload};
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Pets);
    let body = validated_body(entity, body)?;
    let row = pets::create_pet(&state.pool, entity, body).await?;
    Ok(success_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Pets);
    let id = parse_id(&id_str)?;
    let body = validated_body(entity, body)?;
    let row = pets::update_pet(&state.pool, entity, id, body).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Pets);
    let id = parse_id(&id_str)?;
    let removed = pets::delete_pet(&state.pool, entity, id).await?;
    Ok(success_one_ok(removed))
}

/// POST /api/pets/:id/image: multipart `file`, stored and set as the pet's image.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Pets);
    let id = parse_id(&id_str)?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pets WHERE id = $1)")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    if !exists {
        return Err(entity.not_found(id));
    }
    let (name, bytes) = read_file_field(multipart).await?;
    let stored = upload::store(&state.settings.upload_dir, &name, &bytes).await?;
    let row = pets::set_image(&state.pool, entity, id, &stored.image_url).await?;
    Ok(success_one_ok(row))
}
