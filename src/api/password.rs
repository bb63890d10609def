//! Password reset: OTP delivery through the email relay, and the reset call

use serde::Serialize;

use super::client::ApiClient;
use super::error::ApiError;
use crate::config::EmailConfig;

#[derive(Debug, Serialize)]
struct EmailSend<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    email: &'a str,
    passcode: &'a str,
    time: String,
}

#[derive(Debug, Serialize)]
struct ResetBody<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

/// Deliver a one-time code to `email` via the configured email template.
pub async fn request_otp(
    email_client: &ApiClient,
    settings: &EmailConfig,
    email: &str,
    code: &str,
    valid_minutes: i64,
) -> Result<(), ApiError> {
    let (Some(service_id), Some(template_id), Some(public_key)) = (
        settings.service_id.as_deref(),
        settings.template_id.as_deref(),
        settings.public_key.as_deref(),
    ) else {
        return Err(ApiError::Invalid(
            "email service is not configured (service_id, template_id, public_key)".into(),
        ));
    };

    let expires = chrono::Local::now() + chrono::Duration::minutes(valid_minutes);
    let body = EmailSend {
        service_id,
        template_id,
        user_id: public_key,
        template_params: TemplateParams {
            email,
            passcode: code,
            time: expires.format("%H:%M").to_string(),
        },
    };

    tracing::info!("Sending verification code to {}", email);
    email_client.post_json("/email/send", &body).await?;
    Ok(())
}

/// `POST /auth/reset-password`. The code travels with the new password so the
/// server can validate it as well.
pub async fn reset_password(
    client: &ApiClient,
    email: &str,
    otp: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let body = ResetBody {
        email,
        otp,
        password: new_password,
    };
    client.post_json("/auth/reset-password", &body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unconfigured_relay_is_rejected_locally() {
        let client = ApiClient::email("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = tokio_test::block_on(request_otp(
            &client,
            &EmailConfig::default(),
            "neo@matrix.io",
            "482913",
            15,
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[test]
    fn test_reset_body_carries_code() {
        let body = ResetBody {
            email: "neo@matrix.io",
            otp: "482913",
            password: "Abc123",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"email": "neo@matrix.io", "otp": "482913", "password": "Abc123"})
        );
    }
}
