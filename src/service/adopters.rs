//! Adopter removal guarded by existing adoption records.

use crate::catalog::EntityDef;
use crate::error::AppError;
use crate::service::CrudService;
use sqlx::PgPool;

/// Delete an adopter. Rejected while any adoption record references them.
pub async fn delete_adopter(pool: &PgPool, entity: &EntityDef, adopter_id: i32) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM adopters WHERE id = $1 FOR UPDATE")
        .bind(adopter_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(entity.not_found(adopter_id));
    }
    let adoptions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM adoption_records WHERE adopter_id = $1")
        .bind(adopter_id)
        .fetch_one(&mut *tx)
        .await?;
    if adoptions > 0 {
        return Err(AppError::Conflict("Cannot delete adopter with active adoptions".into()));
    }
    CrudService::delete(&mut *tx, entity, adopter_id).await?;
    tx.commit().await?;
    tracing::info!(adopter = adopter_id, "adopter deleted");
    Ok(())
}
