//! Admin SQL console: token gate, keyword denylist, execution with a statement timeout.
//!
//! The denylist is a second line only; the bearer token is what actually protects the database.

use crate::error::AppError;
use crate::service::crud::row_to_json;
use crate::settings::Settings;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Executor, PgConnection, PgPool};
use std::sync::OnceLock;

const FORBIDDEN_PHRASES: [&str; 3] = ["drop table", "drop database", "truncate table"];
const ROW_KEYWORDS: [&str; 6] = ["select", "with", "values", "table", "show", "explain"];

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsoleOutcome {
    Rows { results: Vec<Value>, row_count: usize },
    Affected { affected_rows: u64, message: String },
}

/// Check the presented bearer token against the configured one. No configured token means the
/// console is off.
pub fn authorize(settings: &Settings, presented: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = settings.sql_console_token.as_deref() else {
        return Err(AppError::Forbidden("SQL console is disabled".into()));
    };
    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(AppError::Forbidden("invalid or missing console token".into())),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/|--[^\n]*").expect("static regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn returning_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\breturning\b").expect("static regex"))
}

/// Lowercase, comments replaced by a space, whitespace runs collapsed.
fn normalize(sql: &str) -> String {
    let lower = sql.to_lowercase();
    let no_comments = comment_re().replace_all(&lower, " ");
    whitespace_re().replace_all(&no_comments, " ").trim().to_string()
}

/// Reject statements containing a forbidden phrase in any letter case.
pub fn guard(sql: &str) -> Result<(), AppError> {
    let raw = sql.to_lowercase();
    let normalized = normalize(sql);
    if FORBIDDEN_PHRASES
        .iter()
        .any(|p| raw.contains(p) || normalized.contains(p))
    {
        return Err(AppError::Forbidden(
            "Dangerous operations like DROP TABLE are not allowed".into(),
        ));
    }
    Ok(())
}

/// Whether the statement yields rows (SELECT-shaped or RETURNING) rather than an affected count.
pub fn returns_rows(sql: &str) -> bool {
    let normalized = normalize(sql);
    let head = normalized.trim_start_matches(['(', ' ']);
    let first = head
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    ROW_KEYWORDS.contains(&first) || returning_re().is_match(&normalized)
}

/// Run an already-authorized statement in its own transaction.
pub async fn execute(pool: &PgPool, sql: &str, timeout_ms: u64) -> Result<ConsoleOutcome, AppError> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(AppError::BadRequest("No query provided".into()));
    }
    guard(sql)?;
    tracing::info!(sql = %sql, "console statement");

    let mut tx = pool.begin().await?;
    // A concrete connection type keeps the raw-SQL future Send (required by axum handlers).
    let conn: &mut PgConnection = &mut tx;
    let timeout = format!("SET LOCAL statement_timeout = {}", timeout_ms);
    (&mut *conn).execute(sqlx::query(&timeout)).await?;
    let outcome = if returns_rows(sql) {
        let rows = (&mut *conn).fetch_all(sqlx::raw_sql(sql)).await?;
        let results: Vec<Value> = rows.iter().map(row_to_json).collect();
        ConsoleOutcome::Rows {
            row_count: results.len(),
            results,
        }
    } else {
        let done = conn.execute(sqlx::raw_sql(sql)).await?;
        ConsoleOutcome::Affected {
            affected_rows: done.rows_affected(),
            message: "Query executed successfully".into(),
        }
    };
    tx.commit().await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_ignores_letter_case() {
        for sql in ["DROP TABLE pets", "Drop Database shelter", "truncate TABLE adopters", "select 1; drop table x"] {
            assert!(matches!(guard(sql), Err(AppError::Forbidden(_))), "{sql}");
        }
    }

    #[test]
    fn denylist_sees_through_spacing_and_comments() {
        assert!(guard("DROP\n\t TABLE pets").is_err());
        assert!(guard("drop/**/table pets").is_err());
        assert!(guard("drop -- hi\ntable pets").is_err());
    }

    #[test]
    fn harmless_statements_pass() {
        guard("SELECT * FROM pets WHERE name = 'Droppy'").unwrap();
        guard("DELETE FROM medical_records WHERE id = 4").unwrap();
        guard("drop index pets_shelter_id_idx").unwrap();
    }

    #[test]
    fn classification_by_shape() {
        assert!(returns_rows("select * from pets"));
        assert!(returns_rows("  -- count\n (SELECT count(*) FROM pets)"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(returns_rows("UPDATE pets SET age = 3 WHERE id = 1 RETURNING id"));
        assert!(!returns_rows("UPDATE pets SET age = 3 WHERE id = 1"));
        assert!(!returns_rows("insert into shelters (name) values ('x')"));
        assert!(!returns_rows("selection_table_update"));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn execute_future_is_send() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pet_adoption_unused")
            .unwrap();
        let fut = execute(&pool, "select 1", 1_000);
        assert_send(&fut);
    }

    #[tokio::test]
    async fn empty_statement_is_rejected_before_touching_the_pool() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pet_adoption_unused")
            .unwrap();
        let err = execute(&pool, "  \n ", 1_000).await.unwrap_err();
        assert_eq!(err.to_string(), "No query provided");
    }

    #[test]
    fn console_requires_configured_matching_token() {
        let mut settings = Settings::default();
        assert!(authorize(&settings, Some("anything")).is_err());
        settings.sql_console_token = Some("s3cret".into());
        assert!(authorize(&settings, None).is_err());
        assert!(authorize(&settings, Some("s3cre")).is_err());
        authorize(&settings, Some("s3cret")).unwrap();
    }
}
