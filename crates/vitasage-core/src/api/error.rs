use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API base URL is not configured (set VITE_API_URL)")]
    MissingBaseUrl,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape returned by the backend
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Prefer the backend's `detail` message over the raw body
    fn message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => Self::truncate_body(&detail),
            Ok(ErrorBody { detail }) => Self::truncate_body(&detail.to_string()),
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            400 | 422 => ApiError::BadRequest(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// HTTP status this error was built from, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN, ""), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(StatusCode::NOT_FOUND, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(StatusCode::CONFLICT, ""), ApiError::Conflict(_)));
        assert!(matches!(ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, ""), ApiError::BadRequest(_)));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(StatusCode::IM_A_TEAPOT, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_detail_message_extracted() {
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"detail":"Hospital ID already exists"}"#);
        assert_eq!(err.to_string(), "Conflict: Hospital ID already exists");
    }

    #[test]
    fn test_unauthorized_keeps_server_detail() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid credentials"}"#);
        assert!(matches!(&err, ApiError::Unauthorized(msg) if msg == "Invalid credentials"));
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    }

    #[test]
    fn test_non_json_body_kept() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "nope");
        assert_eq!(err.to_string(), "Resource not found: nope");
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let text = err.to_string();
        assert!(text.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_status_code() {
        assert_eq!(ApiError::Unauthorized(String::new()).status(), Some(401));
        assert_eq!(ApiError::MissingBaseUrl.status(), None);
    }
}
