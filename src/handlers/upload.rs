//! POST /api/upload: store an image and return its public URL.

use crate::error::AppError;
use crate::response::success_one;
use crate::service::upload;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;

/// Read the multipart field named `file`; returns (client file name, bytes).
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {}", e)))?;
        return Ok((name, data));
    }
    Err(AppError::BadRequest("No file uploaded".into()))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (name, bytes) = read_file_field(multipart).await?;
    let stored = upload::store(&state.settings.upload_dir, &name, &bytes).await?;
    Ok(success_one(stored))
}
