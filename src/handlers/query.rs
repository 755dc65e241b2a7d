//! POST /api/query: admin SQL console.

use crate::error::AppError;
use crate::extractors::BearerToken;
use crate::response::success_one_ok;
use crate::service::console;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ConsoleRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub async fn run(
    BearerToken(token): BearerToken,
    State(state): State<AppState>,
    Json(req): Json<ConsoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(e) = console::authorize(&state.settings, token.as_deref()) {
        tracing::warn!(error = %e, "console request rejected");
        return Err(e);
    }
    let sql = req.query.unwrap_or_default();
    if let Err(e) = console::guard(&sql) {
        tracing::warn!(sql = %sql, "console statement rejected by denylist");
        return Err(e);
    }
    let outcome = console::execute(&state.pool, &sql, state.settings.sql_console_timeout_ms).await?;
    Ok(success_one_ok(outcome))
}
