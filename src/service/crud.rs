//! Generic CRUD execution against PostgreSQL, driven by the catalog.
//!
//! Every method takes any Postgres executor so the domain services can run the same
//! statements inside their own transactions.

use crate::catalog::{EntityDef, FilterSpec};
use crate::error::AppError;
use crate::sql::{delete, insert, select_by_id, select_list, update, PgBindValue, QueryBuf};
use serde_json::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow, PgValueFormat};
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u32 = 100;

pub struct CrudService;

impl CrudService {
    /// List rows with optional filters (exact match), limit (default 100, max 1000), offset (default 0).
    pub async fn list<'c, E: PgExecutor<'c>>(
        executor: E,
        entity: &EntityDef,
        filters: &[(&FilterSpec, Value)],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(1000);
        let offset = offset.unwrap_or(0);
        let q = select_list(entity, filters, Some(limit), Some(offset));
        let rows = bind_all(&q).fetch_all(executor).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Fetch one row by primary key, with joined display columns.
    pub async fn read<'c, E: PgExecutor<'c>>(
        executor: E,
        entity: &EntityDef,
        id: i32,
    ) -> Result<Option<Value>, AppError> {
        let mut q = select_by_id(entity);
        q.params.push(Value::from(id));
        Self::fetch_optional(executor, &q).await
    }

    /// Insert one row. Returns the created row including its generated id.
    pub async fn create<'c, E: PgExecutor<'c>>(
        executor: E,
        entity: &EntityDef,
        body: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(entity, body);
        Self::fetch_optional(executor, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Replace one row by id. Returns the updated row or None when the id does not exist.
    pub async fn update<'c, E: PgExecutor<'c>>(
        executor: E,
        entity: &EntityDef,
        id: i32,
        body: &HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = update(entity, &Value::from(id), body);
        Self::fetch_optional(executor, &q).await
    }

    /// Delete one row by id. Returns false when nothing was deleted.
    pub async fn delete<'c, E: PgExecutor<'c>>(
        executor: E,
        entity: &EntityDef,
        id: i32,
    ) -> Result<bool, AppError> {
        let mut q = delete(entity);
        q.params.push(Value::from(id));
        Ok(Self::fetch_optional(executor, &q).await?.is_some())
    }

    async fn fetch_optional<'c, E: PgExecutor<'c>>(executor: E, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        let row = bind_all(q).fetch_optional(executor).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }
}

fn bind_all(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

/// Convert any Postgres row into a JSON object keyed by column name.
pub fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, col.ordinal()));
    }
    Value::Object(map)
}

/// Try the column against each supported type in turn. Columns are addressed by ordinal since
/// console queries may return duplicate names.
fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(idx) {
        return j;
    }
    if let Ok(Some(d)) = row.try_get::<Option<Decimal>, _>(idx) {
        return decimal_to_value(d);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return Value::String(u.to_string());
    }
    text_fallback(row, idx)
}

/// NUMERIC as a JSON number; text when it has no f64 form.
fn decimal_to_value(d: Decimal) -> Value {
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.normalize().to_string()))
}

/// Simple-protocol (console) results arrive as text, so any remaining type (arrays, intervals,
/// NUMERIC beyond Decimal's range) is returned as its Postgres text form.
fn text_fallback(row: &PgRow, idx: usize) -> Value {
    use sqlx::{Decode, Row, ValueRef};
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() || raw.format() != PgValueFormat::Text {
        return Value::Null;
    }
    match <String as Decode<Postgres>>::decode(raw) {
        Ok(s) => Value::String(s),
        Err(_) => Value::Null,
    }
}
