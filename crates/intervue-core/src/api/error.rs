use serde::Deserialize;
use thiserror::Error;

use crate::auth::StorageError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to store session: {0}")]
    Session(#[from] StorageError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shapes the BFF routes return.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
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
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::ServerError {
                status: code,
                body: truncated,
            },
            code => ApiError::Status {
                status: code,
                body: truncated,
            },
        }
    }

    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::ServerError { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) | ApiError::InvalidRequest(_) | ApiError::Session(_) => {
                None
            }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for a notification.
    ///
    /// Prefers the `message` or `error` field of a JSON error body.
    pub fn user_message(&self) -> String {
        let body = match self {
            ApiError::AccessDenied(body) | ApiError::NotFound(body) => Some(body),
            ApiError::ServerError { body, .. } | ApiError::Status { body, .. } => Some(body),
            _ => None,
        };
        let from_body = body
            .and_then(|b| serde_json::from_str::<ErrorBody>(b).ok())
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty());

        match (from_body, self) {
            (Some(message), _) => message,
            (None, ApiError::Unauthorized) => "Your session has expired. Please sign in again.".to_string(),
            (None, ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            (None, other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "").status(),
            Some(502)
        );
        assert_eq!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "").status(),
            Some(422)
        );
    }

    #[test]
    fn test_only_401_is_unauthorized() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::AccessDenied(String::new()).is_unauthorized());
        assert!(!ApiError::InvalidResponse(String::new()).is_unauthorized());
    }

    #[test]
    fn test_body_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError { body, .. } => {
                assert!(body.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
                assert!(body.contains("2000 total bytes"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let body = "é".repeat(400);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn test_user_message_prefers_body() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"Invalid OTP"}"#);
        assert_eq!(err.user_message(), "Invalid OTP");

        let err = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"error":"Plan required"}"#);
        assert_eq!(err.user_message(), "Plan required");

        let err = ApiError::from_status(StatusCode::FORBIDDEN, "plain text");
        assert_eq!(err.user_message(), "Access denied: plain text");
    }
}
