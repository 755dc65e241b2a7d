//! Pet writes that must keep `adoption_status` consistent with adoption records.

use crate::catalog::EntityDef;
use crate::error::AppError;
use crate::service::CrudService;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionStatus {
    Available,
    Pending,
    Adopted,
}

impl AdoptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdoptionStatus::Available => "available",
            AdoptionStatus::Pending => "pending",
            AdoptionStatus::Adopted => "adopted",
        }
    }
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdoptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(AdoptionStatus::Available),
            "pending" => Ok(AdoptionStatus::Pending),
            "adopted" => Ok(AdoptionStatus::Adopted),
            _ => Err(AppError::Validation(format!(
                "invalid adoption status: {} (expected available, pending or adopted)",
                s
            ))),
        }
    }
}

const ADOPT_VIA_RECORD: &str = "a pet becomes adopted only through an adoption record";

/// Locked view of a pet inside a transaction.
pub(crate) struct PetLock {
    pub shelter_id: i32,
    pub status: AdoptionStatus,
    pub has_adoption: bool,
}

/// `SELECT … FOR UPDATE` the pet and report whether an adoption record references it.
pub(crate) async fn lock_pet(conn: &mut PgConnection, pet_id: i32) -> Result<Option<PetLock>, AppError> {
    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT shelter_id, adoption_status FROM pets WHERE id = $1 FOR UPDATE")
            .bind(pet_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((shelter_id, status)) = row else {
        return Ok(None);
    };
    let has_adoption: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM adoption_records WHERE pet_id = $1)")
            .bind(pet_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(Some(PetLock {
        shelter_id,
        status: status.parse()?,
        has_adoption,
    }))
}

fn requested_status(body: &HashMap<String, Value>) -> Result<Option<AdoptionStatus>, AppError> {
    match body.get("adoption_status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(other) => Err(AppError::Validation(format!("invalid adoption status: {}", other))),
    }
}

fn requested_shelter(body: &HashMap<String, Value>) -> Option<i64> {
    match body.get("shelter_id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Insert a pet. New pets may start `available` or `pending`, never `adopted`.
pub async fn create_pet(
    pool: &PgPool,
    entity: &EntityDef,
    mut body: HashMap<String, Value>,
) -> Result<Value, AppError> {
    match requested_status(&body)? {
        Some(AdoptionStatus::Adopted) => return Err(AppError::Conflict(ADOPT_VIA_RECORD.into())),
        Some(status) => {
            body.insert("adoption_status".into(), Value::from(status.as_str()));
        }
        None => {
            body.remove("adoption_status");
        }
    }
    let row = CrudService::create(pool, entity, &body).await?;
    tracing::info!(pet = %row["id"], "pet registered");
    Ok(row)
}

/// Full-row replace of a pet. An adopted pet keeps its status and shelter; any other pet
/// cannot be set to `adopted`. A missing status keeps the current one.
pub async fn update_pet(
    pool: &PgPool,
    entity: &EntityDef,
    pet_id: i32,
    mut body: HashMap<String, Value>,
) -> Result<Value, AppError> {
    let mut tx = pool.begin().await?;
    let pet = lock_pet(&mut tx, pet_id).await?.ok_or_else(|| entity.not_found(pet_id))?;
    let requested = requested_status(&body)?;
    let status = if pet.has_adoption {
        if matches!(requested, Some(s) if s != AdoptionStatus::Adopted) {
            return Err(AppError::Conflict(
                "cannot change the status of an adopted pet; cancel the adoption instead".into(),
            ));
        }
        if requested_shelter(&body).is_some_and(|sid| sid != i64::from(pet.shelter_id)) {
            return Err(AppError::Conflict("cannot move an adopted pet to another shelter".into()));
        }
        AdoptionStatus::Adopted
    } else {
        match requested {
            Some(AdoptionStatus::Adopted) => return Err(AppError::Conflict(ADOPT_VIA_RECORD.into())),
            Some(s) => s,
            None if pet.status == AdoptionStatus::Adopted => AdoptionStatus::Available,
            None => pet.status,
        }
    };
    body.insert("adoption_status".into(), Value::from(status.as_str()));
    let row = CrudService::update(&mut *tx, entity, pet_id, &body)
        .await?
        .ok_or_else(|| entity.not_found(pet_id))?;
    tx.commit().await?;
    Ok(row)
}

#[derive(Debug, Serialize)]
pub struct PetRemoval {
    pub pet_id: i32,
    pub medical_records_removed: u64,
}

/// Delete a pet and its medical records. Adopted pets are rejected.
pub async fn delete_pet(pool: &PgPool, entity: &EntityDef, pet_id: i32) -> Result<PetRemoval, AppError> {
    let mut tx = pool.begin().await?;
    let pet = lock_pet(&mut tx, pet_id).await?.ok_or_else(|| entity.not_found(pet_id))?;
    if pet.has_adoption || pet.status == AdoptionStatus::Adopted {
        return Err(AppError::Conflict("Cannot delete adopted pet".into()));
    }
    let medical = sqlx::query("DELETE FROM medical_records WHERE pet_id = $1")
        .bind(pet_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    CrudService::delete(&mut *tx, entity, pet_id).await?;
    tx.commit().await?;
    tracing::info!(pet = pet_id, medical_records = medical, "pet deleted");
    Ok(PetRemoval {
        pet_id,
        medical_records_removed: medical,
    })
}

/// Point the pet at a newly stored image.
pub async fn set_image(pool: &PgPool, entity: &EntityDef, pet_id: i32, image_url: &str) -> Result<Value, AppError> {
    let updated = sqlx::query("UPDATE pets SET image_url = $1 WHERE id = $2")
        .bind(image_url)
        .bind(pet_id)
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(entity.not_found(pet_id));
    }
    CrudService::read(pool, entity, pet_id)
        .await?
        .ok_or_else(|| entity.not_found(pet_id))
}
