//! # Middleware Components
//!
//! This module provides middleware components for request/response processing
//! in the mission service. Middleware components handle cross-cutting concerns
//! such as CORS and payload validation.
//!
//! ## Middleware Types
//!
//! - **CORS Middleware**: Handles cross-origin request support
//! - **Validation Middleware**: Validates mission payloads and uploads
//!
//! ## Design Patterns
//!
//! - **Static Methods**: Middleware functions are implemented as static methods
//! - **Error Integration**: Validation middleware integrates with the error system

use crate::errors::{AppError, AppResult};
use crate::models::{MissionPatch, NewMission};
use crate::utils::cors_headers;
use worker::*;

/// Middleware for handling Cross-Origin Resource Sharing (CORS) requests.
///
/// Handles both preflight requests and applying headers to API responses.
/// The configuration allows all origins; the service carries no credentials.
pub struct CorsMiddleware;

impl CorsMiddleware {
    /// Applies CORS headers to an existing response.
    pub fn apply_headers(response: Response) -> Response {
        response.with_headers(cors_headers())
    }

    /// Handles CORS preflight requests (OPTIONS method).
    ///
    /// Returns an empty response with the CORS headers so the browser allows
    /// the actual request.
    pub fn handle_preflight() -> Result<Response> {
        Ok(Response::empty()?.with_headers(cors_headers()))
    }
}

/// Middleware for validating request payloads.
///
/// The data model promises non-empty display strings and task targets of at
/// least 1; these checks enforce that at the HTTP boundary so malformed rows
/// never reach the store.
pub struct ValidationMiddleware;

impl ValidationMiddleware {
    /// Validates a create payload.
    ///
    /// # Errors
    ///
    /// - `InvalidField` naming the offending field when a display string is
    ///   blank or a task target is 0
    pub fn validate_new_mission(mission: &NewMission) -> AppResult<()> {
        Self::require_text("title", &mission.title)?;
        Self::require_text("reward", &mission.reward)?;
        for task in &mission.tasks {
            Self::require_text("task text", &task.text)?;
            Self::require_target(task.target)?;
        }
        Ok(())
    }

    /// Validates the fields present in a partial update.
    ///
    /// Absent fields are fine; supplied fields must satisfy the same rules a
    /// create payload does.
    pub fn validate_patch(patch: &MissionPatch) -> AppResult<()> {
        if let Some(title) = &patch.title {
            Self::require_text("title", title)?;
        }
        if let Some(reward) = &patch.reward {
            Self::require_text("reward", reward)?;
        }
        if let Some(tasks) = &patch.tasks {
            for task in tasks {
                Self::require_text("task text", &task.text)?;
                Self::require_target(task.target)?;
            }
        }
        Ok(())
    }

    /// Validates that an upload is within the configured size limit.
    pub fn validate_upload_size(size: u64, max_size: u64) -> AppResult<()> {
        if size > max_size {
            return Err(AppError::UploadTooLarge {
                size,
                max: max_size,
            });
        }
        Ok(())
    }

    /// Validates that an uploaded file belongs to a media family the
    /// application stores.
    ///
    /// # Supported Content Types
    ///
    /// - `image/*`, `video/*`, `audio/*` - the families motivation media
    ///   renders
    /// - `application/octet-stream` - the fallback used when the browser
    ///   supplies no type
    pub fn validate_media_content_type(content_type: &str) -> AppResult<()> {
        const ALLOWED_TYPES: &[&str] = &["image/", "video/", "audio/"];

        let content_type = content_type.to_ascii_lowercase();
        if content_type == "application/octet-stream" {
            return Ok(());
        }
        if !ALLOWED_TYPES
            .iter()
            .any(|&allowed| content_type.starts_with(allowed))
        {
            return Err(AppError::InvalidField {
                field: "file",
                reason: format!("unsupported media type {}", content_type),
            });
        }

        Ok(())
    }

    fn require_text(field: &'static str, value: &str) -> AppResult<()> {
        if value.trim().is_empty() {
            return Err(AppError::InvalidField {
                field,
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn require_target(target: u32) -> AppResult<()> {
        if target == 0 {
            return Err(AppError::InvalidField {
                field: "target",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IconName, NewTask, TimeFrame};

    fn new_mission() -> NewMission {
        NewMission {
            title: "Morning Routine".to_string(),
            reward: "Coffee Beans".to_string(),
            reward_image: None,
            time_frame: TimeFrame::Daily,
            motivation: None,
            tasks: vec![NewTask {
                id: None,
                text: "Wake up at 6".to_string(),
                completions: 0,
                target: 1,
                icon: IconName::Coffee,
            }],
            motivation_media: None,
        }
    }

    #[test]
    fn valid_mission_passes() {
        assert!(ValidationMiddleware::validate_new_mission(&new_mission()).is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut mission = new_mission();
        mission.title = "   ".to_string();
        let err = ValidationMiddleware::validate_new_mission(&mission).unwrap_err();
        assert!(matches!(err, AppError::InvalidField { field: "title", .. }));
    }

    #[test]
    fn zero_target_is_rejected() {
        let mut mission = new_mission();
        mission.tasks[0].target = 0;
        let err = ValidationMiddleware::validate_new_mission(&mission).unwrap_err();
        assert!(matches!(err, AppError::InvalidField { field: "target", .. }));
    }

    #[test]
    fn patch_only_checks_present_fields() {
        assert!(ValidationMiddleware::validate_patch(&MissionPatch::default()).is_ok());
        let patch = MissionPatch {
            reward: Some(String::new()),
            ..Default::default()
        };
        assert!(ValidationMiddleware::validate_patch(&patch).is_err());
    }

    #[test]
    fn validate_upload_size_allows_within_limit() {
        assert!(ValidationMiddleware::validate_upload_size(1_048_576, 10_485_760).is_ok());
    }

    #[test]
    fn validate_upload_size_rejects_over_limit() {
        let err = ValidationMiddleware::validate_upload_size(20, 10).unwrap_err();
        assert!(matches!(err, AppError::UploadTooLarge { .. }));
    }

    #[test]
    fn validate_content_type_accepts_media_families() {
        assert!(ValidationMiddleware::validate_media_content_type("image/png").is_ok());
        assert!(ValidationMiddleware::validate_media_content_type("video/mp4").is_ok());
        assert!(ValidationMiddleware::validate_media_content_type("audio/mpeg").is_ok());
        assert!(
            ValidationMiddleware::validate_media_content_type("application/octet-stream").is_ok()
        );
    }

    #[test]
    fn validate_content_type_rejects_unknown_type() {
        let err =
            ValidationMiddleware::validate_media_content_type("application/x-msdownload")
                .unwrap_err();
        assert!(matches!(err, AppError::InvalidField { .. }));
    }
}
