//! # Upload Handler
//!
//! Single-shot multipart upload of motivation media to R2.
//!
//! ## Flow
//!
//! 1. Parse the multipart form; exactly one file field named `file`
//! 2. Validate size and media family
//! 3. Store under `{folder}/{timestamp}-{name}` with no overwrite
//! 4. Answer with the public URL and basic metadata

use chrono::Utc;
use worker::*;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::MediaKind;
use crate::utils::object_key;

/// `POST /api/upload` (`multipart/form-data`)
///
/// Fields: `file` (binary, required), `folder` (optional, defaults to
/// `motivation`). A missing or non-file `file` value is rejected before the
/// bucket is touched.
///
/// # Response
///
/// ```json
/// { "url": "...", "path": "...", "name": "...", "mimeType": "..." }
/// ```
pub async fn upload_media(
    mut req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<Response> {
    let form = req
        .form_data()
        .await
        .map_err(|_| AppError::BadRequest("Expected multipart form data".to_string()))?;

    let file = match form.get("file") {
        Some(FormEntry::File(file)) => file,
        Some(FormEntry::Field(_)) | None => return Err(AppError::MissingFile),
    };
    let folder = match form.get("folder") {
        Some(FormEntry::Field(folder)) => folder,
        _ => crate::constants::DEFAULT_UPLOAD_FOLDER.to_string(),
    };

    let name = file.name();
    let mime_type = match file.type_() {
        t if t.is_empty() => "application/octet-stream".to_string(),
        t => t,
    };
    ValidationMiddleware::validate_upload_size(file.size() as u64, config.max_upload_size)?;
    ValidationMiddleware::validate_media_content_type(&mime_type)?;

    let key = object_key(&folder, &name, Utc::now().timestamp_millis());
    let bucket = env.bucket(&config.bucket_name)?;

    // The timestamp prefix makes collisions unlikely; refuse to overwrite if
    // one happens anyway.
    if bucket
        .head(key.clone())
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?
        .is_some()
    {
        return Err(AppError::Storage(format!(
            "object already exists at {}",
            key
        )));
    }

    let bytes = file
        .bytes()
        .await
        .map_err(|_| AppError::BadRequest("Failed to read file data".to_string()))?;

    bucket
        .put(key.clone(), bytes)
        .http_metadata(HttpMetadata {
            content_type: Some(mime_type.clone()),
            ..HttpMetadata::default()
        })
        .execute()
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    logger.info(
        "Stored media object",
        log_data!(
            "path" => key.clone(),
            "kind" => format!("{:?}", MediaKind::from_mime(&mime_type))
        ),
    );

    Ok(Response::from_json(&serde_json::json!({
        "url": config.public_media_url(&key),
        "path": key,
        "name": name,
        "mimeType": mime_type,
    }))?)
}
