//! Bootstrap DDL for the five tables. Idempotent; runs at startup.
//!
//! Foreign keys have no ON DELETE actions: cascades are done explicitly by the services so they
//! run under the same row locks as adoption.

use crate::error::AppError;
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS shelters (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT,
        phone TEXT,
        email TEXT
    )",
    "CREATE TABLE IF NOT EXISTS adopters (
        id SERIAL PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        address TEXT,
        account TEXT
    )",
    "CREATE TABLE IF NOT EXISTS pets (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        species TEXT NOT NULL,
        gender TEXT,
        age INTEGER CHECK (age IS NULL OR age >= 0),
        adoption_status TEXT NOT NULL DEFAULT 'available'
            CHECK (adoption_status IN ('available', 'pending', 'adopted')),
        image_url TEXT,
        shelter_id INTEGER NOT NULL REFERENCES shelters (id),
        added_date DATE NOT NULL DEFAULT CURRENT_DATE
    )",
    "CREATE TABLE IF NOT EXISTS adoption_records (
        id SERIAL PRIMARY KEY,
        adopter_id INTEGER NOT NULL REFERENCES adopters (id),
        pet_id INTEGER NOT NULL REFERENCES pets (id),
        shelter_id INTEGER NOT NULL REFERENCES shelters (id),
        adoption_date DATE NOT NULL DEFAULT CURRENT_DATE,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS medical_records (
        id SERIAL PRIMARY KEY,
        pet_id INTEGER NOT NULL REFERENCES pets (id),
        checkup_date DATE NOT NULL,
        condition TEXT,
        treatment TEXT,
        vet_name TEXT
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS adoption_records_pet_id_key ON adoption_records (pet_id)",
    "CREATE INDEX IF NOT EXISTS adoption_records_adopter_id_idx ON adoption_records (adopter_id)",
    "CREATE INDEX IF NOT EXISTS adoption_records_shelter_id_idx ON adoption_records (shelter_id)",
    "CREATE INDEX IF NOT EXISTS pets_shelter_id_idx ON pets (shelter_id)",
    "CREATE INDEX IF NOT EXISTS medical_records_pet_id_idx ON medical_records (pet_id)",
];

pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    // Serializes concurrent bootstraps (server plus test binaries on one database).
    sqlx::query("SELECT pg_advisory_xact_lock(727274)")
        .execute(&mut *tx)
        .await?;
    for sql in STATEMENTS {
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = STATEMENTS.len(), "schema ready");
    Ok(())
}
