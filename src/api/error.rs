//! Normalised API failure

use reqwest::StatusCode;

/// Message shown when a failure carries nothing more specific.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Every facade returns this error; transport and server failures share one shape.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable response (connection refused, DNS, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a structured (JSON) error body.
    #[error("HTTP {}: {}", .status.as_u16(), display_body(.body))]
    Server {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// Server answered with a non-JSON error body.
    #[error("HTTP {}: {text}", .status.as_u16())]
    Status { status: StatusCode, text: String },

    /// Success status, but the body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A newer request of the same kind replaced this one.
    #[error("request superseded by a newer one")]
    Cancelled,

    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ApiError {
    /// Classify a non-2xx response by its body.
    pub fn from_failure(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => ApiError::Server {
                status,
                body: value,
            },
            Err(_) => ApiError::Status {
                status,
                text: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Server-supplied human message, if any.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Server { body, .. } => body_message(body),
            ApiError::Status { text, .. } if !text.is_empty() => Some(text.clone()),
            _ => None,
        }
    }

    /// Text for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { .. } | ApiError::Status { .. } => self
                .server_message()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ApiError::Transport(_) | ApiError::Decode(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

fn display_body(body: &serde_json::Value) -> String {
    body_message(body).unwrap_or_else(|| body.to_string())
}

/// Pull a message out of the error shapes the backend produces:
/// `{"error": ...}` from the app handlers and `{"msg": ...}` from the JWT layer.
fn body_message(body: &serde_json::Value) -> Option<String> {
    if let Some(s) = body.as_str() {
        return (!s.is_empty()).then(|| s.to_string());
    }
    ["error", "message", "msg", "description"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_body_is_surfaced() {
        let err = ApiError::from_failure(
            StatusCode::BAD_REQUEST,
            br#"{"error": "User Does not exist", "type": "UserDoesNotExist"}"#,
        );
        match &err {
            ApiError::Server { status, body } => {
                assert_eq!(*status, StatusCode::BAD_REQUEST);
                assert_eq!(body["type"], "UserDoesNotExist");
            }
            other => panic!("expected Server, got {:?}", other),
        }
        assert_eq!(err.server_message().as_deref(), Some("User Does not exist"));
        assert_eq!(err.user_message(), "User Does not exist");
    }

    #[test]
    fn test_jwt_layer_message() {
        let err = ApiError::from_failure(
            StatusCode::UNAUTHORIZED,
            br#"{"msg": "Missing cookie \"access_token_cookie\""}"#,
        );
        assert!(err.is_unauthorized());
        assert_eq!(
            err.server_message().as_deref(),
            Some("Missing cookie \"access_token_cookie\"")
        );
    }

    #[test]
    fn test_plain_body_falls_back_to_status() {
        let err = ApiError::from_failure(StatusCode::BAD_GATEWAY, b"<html>upstream down</html>");
        match &err {
            ApiError::Status { status, text } => {
                assert_eq!(*status, StatusCode::BAD_GATEWAY);
                assert!(text.contains("upstream down"));
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_message_when_body_is_empty() {
        let err = ApiError::from_failure(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ApiError::from_failure(StatusCode::INTERNAL_SERVER_ERROR, b"{}");
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }
}
