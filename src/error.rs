use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Timeout waiting for server response")]
    Timeout,

    #[error("Invalid focal point ({x}, {y}): coordinates must be within [-1, 1]")]
    InvalidFocalPoint { x: f64, y: f64 },

    #[error("{0}")]
    Custom(String),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Custom(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Custom(s.to_string())
    }
}

/// Ошибка загрузки медиа. Возвращается вызывающему как значение,
/// повторных попыток загрузчик не делает.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image upload transport error: {0}")]
    Transport(#[source] AppError),

    #[error("image upload error: HTTP/{status} {reason}")]
    Status { status: u16, reason: String },

    #[error("image upload response json decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("image upload response has no media id")]
    MissingId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_conversions() {
        let err: AppError = "boom".into();
        assert_eq!(err.to_string(), "boom");

        let err: AppError = String::from("bang").into();
        assert!(matches!(err, AppError::Custom(ref s) if s == "bang"));
    }

    #[test]
    fn test_upload_status_message() {
        let err = UploadError::Status {
            status: 422,
            reason: "Unprocessable Entity".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "image upload error: HTTP/422 Unprocessable Entity"
        );
    }
}
