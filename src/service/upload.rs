//! Image storage on the local filesystem, served back under `/uploads`.

use crate::error::AppError;
use crate::settings::UPLOAD_URL_PREFIX;
use serde::Serialize;
use std::path::Path;

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub file_name: String,
    pub image_url: String,
}

/// Keep only the last path component and `[A-Za-z0-9._-]`; never returns an empty or dot-leading name.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write the bytes under `dir` as `<unix-millis>-<8 hex>-<sanitized name>`.
pub async fn store(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("uploaded file is empty".into()));
    }
    tokio::fs::create_dir_all(dir).await?;
    let unique = uuid::Uuid::new_v4().simple().to_string();
    let file_name = format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &unique[..8],
        sanitize_file_name(original_name)
    );
    tokio::fs::write(dir.join(&file_name), bytes).await?;
    tracing::info!(file = %file_name, size = bytes.len(), "upload stored");
    Ok(StoredFile {
        image_url: format!("{}/{}", UPLOAD_URL_PREFIX, file_name),
        file_name,
    })
}
