use http::StatusCode;
use thiserror::Error;
use worker::Error as WorkerError;

/// Convenience alias used by handlers and the store.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error taxonomy.
///
/// `Storage` carries the storage layer's message verbatim; it is surfaced to
/// the client unchanged. Everything that is the caller's fault maps to a 4xx
/// in [`AppError::status_code`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
    #[error("Missing {0}")]
    MissingParameter(&'static str),
    #[error("Missing file")]
    MissingFile,
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Upload of {size} bytes exceeds the {max} byte limit")]
    UploadTooLarge { size: u64, max: u64 },
    #[error("Not Found")]
    NotFound,
}

impl AppError {
    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Worker(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MissingParameter(_)
            | AppError::MissingFile
            | AppError::BadRequest(_)
            | AppError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            AppError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Convert into the `{"error": <message>}` JSON response the API
    /// contract promises for every non-2xx outcome.
    pub fn to_response(&self) -> worker::Result<worker::Response> {
        let body = serde_json::json!({ "error": self.to_string() });
        Ok(worker::Response::from_json(&body)?.with_status(self.status_code().as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_message_passes_through_verbatim() {
        let err = AppError::Storage("column \"motivationmedia\" does not exist".to_string());
        assert_eq!(err.to_string(), "column \"motivationmedia\" does not exist");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_id_is_a_client_error() {
        assert_eq!(
            AppError::MissingParameter("id").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingParameter("id").to_string(), "Missing id");
    }

    #[test]
    fn missing_file_is_a_client_error() {
        assert_eq!(AppError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    }
}
