//! Generic resource handlers: list, read, create, update, delete.
//! Routes bind them to one resource with a marker type, e.g. `get(list::<Adopters>)`.

use crate::case::{object_into_snake_case, query_into_snake_case};
use crate::catalog::{EntityDef, FilterSpec, ResourceKind, SqlType, ValidationRule};
use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{int_value, CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) fn parse_id(id_str: &str) -> Result<i32, AppError> {
    id_str
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

/// Request body as a snake_case keyed map.
pub(crate) fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(object_into_snake_case(m)),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Integer field from a body that may carry numbers or numeric strings (HTML form values).
pub(crate) fn int_field(body: &HashMap<String, Value>, name: &str) -> Result<Option<i32>, AppError> {
    match body.get(name) {
        None => Ok(None),
        Some(v) => int_value(name, v),
    }
}

pub(crate) fn required_int_field(body: &HashMap<String, Value>, name: &str) -> Result<i32, AppError> {
    int_field(body, name)?.ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

fn filter_value(filter: &FilterSpec, sql_type: SqlType, raw: &str) -> Result<Value, AppError> {
    match sql_type {
        SqlType::Int4 => raw
            .trim()
            .parse::<i32>()
            .map(Value::from)
            .map_err(|_| AppError::BadRequest(format!("{} must be an integer", filter.param))),
        SqlType::Text | SqlType::Date => Ok(Value::String(raw.to_string())),
    }
}

/// Parsed list query: filters in a stable order, pagination.
pub(crate) struct ListQuery<'a> {
    pub filters: Vec<(&'a FilterSpec, Value)>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Translate query parameters into filters; unknown parameters and `all` are ignored.
pub(crate) fn list_query(entity: &EntityDef, params: HashMap<String, String>) -> Result<ListQuery<'_>, AppError> {
    let mut out = ListQuery {
        filters: Vec::new(),
        limit: None,
        offset: None,
    };
    for (k, v) in query_into_snake_case(params) {
        match k.as_str() {
            "limit" => out.limit = v.parse().ok(),
            "offset" => out.offset = v.parse().ok(),
            _ => {
                let Some(filter) = entity.filter_for_param(&k) else { continue };
                if v.trim().is_empty() || v.eq_ignore_ascii_case("all") {
                    continue;
                }
                let Some(column) = entity.column(&filter.column) else { continue };
                out.filters.push((filter, filter_value(filter, column.sql_type, &v)?));
            }
        }
    }
    out.filters.sort_by(|a, b| a.0.param.cmp(&b.0.param));
    Ok(out)
}

/// Rules for columns an update may change; fixed columns are not required on edits.
pub(crate) fn updatable_rules(entity: &EntityDef) -> HashMap<String, ValidationRule> {
    entity
        .validation
        .iter()
        .filter(|(name, _)| entity.column(name).is_some_and(|c| c.updatable))
        .map(|(name, rule)| (name.clone(), rule.clone()))
        .collect()
}

pub(crate) fn validated_body(entity: &EntityDef, body: Value) -> Result<HashMap<String, Value>, AppError> {
    let mut body = body_to_map(body)?;
    RequestValidator::coerce_types(&mut body, entity)?;
    RequestValidator::validate(&body, &entity.validation)?;
    Ok(body)
}

pub async fn list<R: ResourceKind>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(R::RESOURCE);
    let q = list_query(entity, params)?;
    let rows = CrudService::list(&state.pool, entity, &q.filters, q.limit, q.offset).await?;
    Ok(success_many(rows))
}

pub async fn read<R: ResourceKind>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(R::RESOURCE);
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, entity, id)
        .await?
        .ok_or_else(|| entity.not_found(id))?;
    Ok(success_one_ok(row))
}

pub async fn create<R: ResourceKind>(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(R::RESOURCE);
    let body = validated_body(entity, body)?;
    let row = CrudService::create(&state.pool, entity, &body).await?;
    tracing::info!(resource = %entity.path_segment, id = %row["id"], "created");
    Ok(success_one(row))
}

pub async fn update<R: ResourceKind>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(R::RESOURCE);
    let id = parse_id(&id_str)?;
    let body = validated_body(entity, body)?;
    let row = CrudService::update(&state.pool, entity, id, &body)
        .await?
        .ok_or_else(|| entity.not_found(id))?;
    Ok(success_one_ok(row))
}

pub async fn delete<R: ResourceKind>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = state.catalog.entity(R::RESOURCE);
    let id = parse_id(&id_str)?;
    if !CrudService::delete(&state.pool, entity, id).await? {
        return Err(entity.not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
