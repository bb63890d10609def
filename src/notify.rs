//! User-facing notices printed by commands

use crate::api::{ApiError, GENERIC_FAILURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: title.to_string(),
            description: description.into(),
        }
    }

    /// Error notice from an API failure, falling back to the generic text.
    pub fn from_api(title: &str, err: &ApiError) -> Self {
        Self::error(title, err.user_message())
    }

    /// Error notice for anything that bubbled up through anyhow.
    pub fn from_any(title: &str, err: &anyhow::Error) -> Self {
        let description = match err.downcast_ref::<ApiError>() {
            Some(api) => api.user_message(),
            None if err.to_string().is_empty() => GENERIC_FAILURE.to_string(),
            None => err.to_string(),
        };
        Self::error(title, description)
    }

    pub fn render(&self) -> String {
        let mark = match self.level {
            Level::Success => "✓",
            Level::Error => "✗",
        };
        format!("{} {}: {}", mark, self.title, self.description)
    }

    pub fn print(&self) {
        match self.level {
            Level::Success => println!("{}", self.render()),
            Level::Error => eprintln!("{}", self.render()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_message_is_used() {
        let err = ApiError::from_failure(
            StatusCode::BAD_REQUEST,
            br#"{"error": "Email already in use", "type": "DuplicateKeyError"}"#,
        );
        let notice = Notice::from_api("Sign up failed", &err);
        assert_eq!(notice.level, Level::Error);
        assert_eq!(notice.description, "Email already in use");
        assert_eq!(notice.render(), "✗ Sign up failed: Email already in use");
    }

    #[test]
    fn test_generic_fallback() {
        let err = ApiError::from_failure(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert_eq!(Notice::from_api("Error", &err).description, GENERIC_FAILURE);
    }

    #[test]
    fn test_from_anyhow_unwraps_api_error() {
        let err: anyhow::Error =
            ApiError::from_failure(StatusCode::UNAUTHORIZED, br#"{"msg": "Token has expired"}"#)
                .into();
        assert_eq!(Notice::from_any("Error", &err).description, "Token has expired");

        let other = anyhow::anyhow!("Passwords do not match.");
        assert_eq!(
            Notice::from_any("Error", &other).description,
            "Passwords do not match."
        );
    }
}
