//! Adopting a pet and cancelling an adoption, each as one transaction.
//!
//! Both lock the pet row first, so concurrent attempts on the same pet serialize and at
//! most one adoption record can exist per pet.

use crate::catalog::EntityDef;
use crate::error::AppError;
use crate::service::pets::{lock_pet, AdoptionStatus};
use crate::service::{int_value, CrudService};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct AdoptRequest {
    pub adopter_id: i32,
    pub pet_id: i32,
    /// When given it must be the pet's own shelter.
    pub shelter_id: Option<i32>,
    pub notes: Option<String>,
    /// Defaults to today in the database.
    pub adoption_date: Option<NaiveDate>,
}

/// Claim an available pet for an adopter. A pet that is pending or adopted is a conflict and
/// no record is written.
pub async fn adopt(pool: &PgPool, entity: &EntityDef, req: AdoptRequest) -> Result<Value, AppError> {
    let mut tx = pool.begin().await?;
    let pet = lock_pet(&mut tx, req.pet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pet {} not found", req.pet_id)))?;
    if pet.status != AdoptionStatus::Available || pet.has_adoption {
        return Err(AppError::Conflict("Pet is not available for adoption".into()));
    }
    let adopter_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM adopters WHERE id = $1)")
        .bind(req.adopter_id)
        .fetch_one(&mut *tx)
        .await?;
    if !adopter_exists {
        return Err(AppError::NotFound(format!("Adopter {} not found", req.adopter_id)));
    }
    if let Some(sid) = req.shelter_id {
        if sid != pet.shelter_id {
            return Err(AppError::BadRequest(format!(
                "pet {} belongs to shelter {}, not {}",
                req.pet_id, pet.shelter_id, sid
            )));
        }
    }

    let mut body: HashMap<String, Value> = HashMap::new();
    body.insert("adopter_id".into(), Value::from(req.adopter_id));
    body.insert("pet_id".into(), Value::from(req.pet_id));
    body.insert("shelter_id".into(), Value::from(pet.shelter_id));
    body.insert("notes".into(), req.notes.map(Value::from).unwrap_or(Value::Null));
    if let Some(date) = req.adoption_date {
        body.insert("adoption_date".into(), Value::from(date.format("%Y-%m-%d").to_string()));
    }
    let record = CrudService::create(&mut *tx, entity, &body).await?;
    sqlx::query("UPDATE pets SET adoption_status = $1 WHERE id = $2")
        .bind(AdoptionStatus::Adopted.as_str())
        .bind(req.pet_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(pet = req.pet_id, adopter = req.adopter_id, record = %record["id"], "pet adopted");
    Ok(record)
}

/// Edit an adoption record's date and notes. Adopter, pet and shelter are fixed once recorded:
/// sending them is allowed only with the stored values. An absent date or notes keeps what is
/// stored; the date cannot be cleared.
pub async fn update_adoption(
    pool: &PgPool,
    entity: &EntityDef,
    adoption_id: i32,
    mut body: HashMap<String, Value>,
) -> Result<Value, AppError> {
    let mut tx = pool.begin().await?;
    let current: Option<(i32, i32, i32, NaiveDate, Option<String>)> = sqlx::query_as(
        "SELECT adopter_id, pet_id, shelter_id, adoption_date, notes FROM adoption_records WHERE id = $1 FOR UPDATE",
    )
    .bind(adoption_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (adopter_id, pet_id, shelter_id, adoption_date, notes) =
        current.ok_or_else(|| entity.not_found(adoption_id))?;

    for (name, stored) in [("adopter_id", adopter_id), ("pet_id", pet_id), ("shelter_id", shelter_id)] {
        let given = match body.get(name) {
            Some(v) => int_value(name, v)?,
            None => None,
        };
        if given.is_some_and(|g| g != stored) {
            return Err(AppError::BadRequest(format!(
                "{} of adoption record {} cannot be changed",
                name, adoption_id
            )));
        }
    }
    if body.get("adoption_date").map_or(true, Value::is_null) {
        body.insert("adoption_date".into(), Value::from(adoption_date.format("%Y-%m-%d").to_string()));
    }
    if !body.contains_key("notes") {
        body.insert("notes".into(), notes.map(Value::from).unwrap_or(Value::Null));
    }

    let row = CrudService::update(&mut *tx, entity, adoption_id, &body)
        .await?
        .ok_or_else(|| entity.not_found(adoption_id))?;
    tx.commit().await?;
    Ok(row)
}

#[derive(Debug, Serialize)]
pub struct Cancellation {
    pub adoption_id: i32,
    pub pet_id: i32,
    pub adoption_status: AdoptionStatus,
}

/// Delete an adoption record and make its pet available again.
pub async fn cancel(pool: &PgPool, entity: &EntityDef, adoption_id: i32) -> Result<Cancellation, AppError> {
    let mut tx = pool.begin().await?;
    let pet_id: Option<i32> = sqlx::query_scalar("SELECT pet_id FROM adoption_records WHERE id = $1")
        .bind(adoption_id)
        .fetch_optional(&mut *tx)
        .await?;
    let pet_id = pet_id.ok_or_else(|| entity.not_found(adoption_id))?;
    lock_pet(&mut tx, pet_id).await?;
    if !CrudService::delete(&mut *tx, entity, adoption_id).await? {
        // Cancelled by a concurrent request between the lookup and the lock.
        return Err(entity.not_found(adoption_id));
    }
    sqlx::query("UPDATE pets SET adoption_status = $1 WHERE id = $2")
        .bind(AdoptionStatus::Available.as_str())
        .bind(pet_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(pet = pet_id, record = adoption_id, "adoption cancelled");
    Ok(Cancellation {
        adoption_id,
        pet_id,
        adoption_status: AdoptionStatus::Available,
    })
}
