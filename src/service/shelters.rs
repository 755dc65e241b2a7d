//! Shelter cascade delete and dashboard counts.

use crate::catalog::EntityDef;
use crate::error::AppError;
use crate::service::CrudService;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
pub struct ShelterRemoval {
    pub shelter_id: i32,
    pub pets_removed: u64,
    pub medical_records_removed: u64,
    pub adoptions_removed: u64,
}

/// Delete a shelter with all of its pets and their medical and adoption records in one
/// transaction. Pets are locked before the shelter, the same order adoption uses.
pub async fn delete_shelter(pool: &PgPool, entity: &EntityDef, shelter_id: i32) -> Result<ShelterRemoval, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT id FROM pets WHERE shelter_id = $1 FOR UPDATE")
        .bind(shelter_id)
        .execute(&mut *tx)
        .await?;
    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM shelters WHERE id = $1 FOR UPDATE")
        .bind(shelter_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(entity.not_found(shelter_id));
    }

    let medical_records_removed = sqlx::query(
        "DELETE FROM medical_records WHERE pet_id IN (SELECT id FROM pets WHERE shelter_id = $1)",
    )
    .bind(shelter_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    let adoptions_removed = sqlx::query(
        "DELETE FROM adoption_records WHERE shelter_id = $1 OR pet_id IN (SELECT id FROM pets WHERE shelter_id = $1)",
    )
    .bind(shelter_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    let pets_removed = sqlx::query("DELETE FROM pets WHERE shelter_id = $1")
        .bind(shelter_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    CrudService::delete(&mut *tx, entity, shelter_id).await?;
    tx.commit().await?;

    tracing::info!(
        shelter = shelter_id,
        pets = pets_removed,
        medical_records = medical_records_removed,
        adoptions = adoptions_removed,
        "shelter deleted"
    );
    Ok(ShelterRemoval {
        shelter_id,
        pets_removed,
        medical_records_removed,
        adoptions_removed,
    })
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShelterStats {
    pub shelter_id: i32,
    pub total_pets: i64,
    pub available: i64,
    pub pending: i64,
    pub adopted: i64,
    pub adoptions: i64,
}

pub async fn shelter_stats(pool: &PgPool, entity: &EntityDef, shelter_id: i32) -> Result<ShelterStats, AppError> {
    sqlx::query_as::<_, ShelterStats>(
        "SELECT s.id AS shelter_id, \
           (SELECT COUNT(*) FROM pets p WHERE p.shelter_id = s.id) AS total_pets, \
           (SELECT COUNT(*) FROM pets p WHERE p.shelter_id = s.id AND p.adoption_status = 'available') AS available, \
           (SELECT COUNT(*) FROM pets p WHERE p.shelter_id = s.id AND p.adoption_status = 'pending') AS pending, \
           (SELECT COUNT(*) FROM pets p WHERE p.shelter_id = s.id AND p.adoption_status = 'adopted') AS adopted, \
           (SELECT COUNT(*) FROM adoption_records r WHERE r.shelter_id = s.id) AS adoptions \
         FROM shelters s WHERE s.id = $1",
    )
    .bind(shelter_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| entity.not_found(shelter_id))
}
