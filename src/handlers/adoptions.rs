//! Adopt (POST), edit (PUT) and cancel (DELETE). Listing and reading use the generic handlers.

use crate::catalog::Resource;
use crate::error::AppError;
use crate::handlers::entity::{body_to_map, int_field, parse_id, required_int_field, updatable_rules, validated_body};
use crate::response::{success_one, success_one_ok};
use crate::service::adoptions::{self, AdoptRequest};
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde_json::Value;

pub async fn adopt(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Adoptions);
    let body = validated_body(entity, body)?;
    let adoption_date = match body.get("adoption_date").and_then(Value::as_str) {
        Some(s) => Some(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| AppError::Validation("adoption_date must be a date (YYYY-MM-DD)".into()))?,
        ),
        None => None,
    };
    let req = AdoptRequest {
        adopter_id: required_int_field(&body, "adopter_id")?,
        pet_id: required_int_field(&body, "pet_id")?,
        shelter_id: int_field(&body, "shelter_id")?,
        notes: body.get("notes").and_then(Value::as_str).map(str::to_string),
        adoption_date,
    };
    let record = adoptions::adopt(&state.pool, entity, req).await?;
    Ok(success_one(record))
}

/// PUT /api/adoptions/:id: only the date and notes change; the rest of the record is fixed.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Adoptions);
    let id = parse_id(&id_str)?;
    let mut body = body_to_map(body)?;
    RequestValidator::coerce_types(&mut body, entity)?;
    RequestValidator::validate(&body, &updatable_rules(entity))?;
    let row = adoptions::update_adoption(&state.pool, entity, id, body).await?;
    Ok(success_one_ok(row))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(Resource::Adoptions);
    let id = parse_id(&id_str)?;
    let cancelled = adoptions::cancel(&state.pool, entity, id).await?;
    Ok(success_one_ok(cancelled))
}
