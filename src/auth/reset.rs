//! Forgot-password flow
//!
//! A random six-digit code is mailed to the user and held locally as an
//! [`OtpChallenge`]. Once the user types it back correctly the flow moves on
//! to choosing a new password. The code also travels with the reset call so
//! the server can check it again.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const OTP_LEN: usize = 6;
pub const OTP_TTL_MINUTES: i64 = 15;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResetError {
    #[error("The code must be exactly 6 digits.")]
    InvalidFormat,
    #[error("Invalid OTP. Please try again.")]
    Mismatch,
    #[error("The code has expired. Request a new one.")]
    Expired,
    #[error("Enter a new password.")]
    EmptyPassword,
    #[error("Passwords do not match.")]
    PasswordsDoNotMatch,
    #[error("Verify the emailed code first.")]
    NotVerified,
}

#[derive(Debug, Clone)]
pub struct OtpChallenge {
    code: String,
    issued_at: DateTime<Utc>,
    ttl: Duration,
}

impl OtpChallenge {
    /// Fresh random code in `100000..=999999`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let code = rand::thread_rng().gen_range(100_000..1_000_000u32);
        Self::with_code(code.to_string(), now)
    }

    pub fn with_code(code: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            issued_at,
            ttl: Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.ttl
    }

    /// Format is checked before anything is compared. The input is taken
    /// as is; callers strip line endings.
    pub fn verify(&self, input: &str, now: DateTime<Utc>) -> Result<(), ResetError> {
        if input.len() != OTP_LEN || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ResetError::InvalidFormat);
        }
        if now > self.expires_at() {
            return Err(ResetError::Expired);
        }
        if input != self.code {
            return Err(ResetError::Mismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStage {
    AwaitingOtp,
    ChoosingPassword,
}

/// Everything the reset call needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSubmission {
    pub email: String,
    pub otp: String,
    pub password: String,
}

pub fn check_passwords(new_password: &str, confirm: &str) -> Result<(), ResetError> {
    if new_password.is_empty() {
        return Err(ResetError::EmptyPassword);
    }
    if new_password != confirm {
        return Err(ResetError::PasswordsDoNotMatch);
    }
    Ok(())
}

#[derive(Debug)]
pub struct PasswordReset {
    email: String,
    challenge: OtpChallenge,
    stage: ResetStage,
}

impl PasswordReset {
    pub fn new(email: impl Into<String>, challenge: OtpChallenge) -> Self {
        Self {
            email: email.into(),
            challenge,
            stage: ResetStage::AwaitingOtp,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn challenge(&self) -> &OtpChallenge {
        &self.challenge
    }

    pub fn stage(&self) -> ResetStage {
        self.stage
    }

    /// Advance to password selection on a correct code. Any error leaves
    /// the stage where it was.
    pub fn submit_otp(&mut self, input: &str, now: DateTime<Utc>) -> Result<(), ResetError> {
        self.challenge.verify(input, now)?;
        self.stage = ResetStage::ChoosingPassword;
        Ok(())
    }

    /// Build the reset request once both password entries agree.
    pub fn submission(&self, new_password: &str, confirm: &str) -> Result<ResetSubmission, ResetError> {
        if self.stage != ResetStage::ChoosingPassword {
            return Err(ResetError::NotVerified);
        }
        check_passwords(new_password, confirm)?;
        Ok(ResetSubmission {
            email: self.email.clone(),
            otp: self.challenge.code.clone(),
            password: new_password.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> (PasswordReset, DateTime<Utc>) {
        let now = Utc::now();
        let challenge = OtpChallenge::with_code("482913", now);
        (PasswordReset::new("neo@matrix.io", challenge), now)
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..50 {
            let challenge = OtpChallenge::generate(Utc::now());
            assert_eq!(challenge.code().len(), OTP_LEN);
            assert!(challenge.code().bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(challenge.code().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn test_correct_code_advances() {
        let (mut reset, now) = flow();
        reset.submit_otp("482913", now).unwrap();
        assert_eq!(reset.stage(), ResetStage::ChoosingPassword);
    }

    #[test]
    fn test_wrong_code_keeps_stage() {
        let (mut reset, now) = flow();
        assert_eq!(reset.submit_otp("482914", now), Err(ResetError::Mismatch));
        assert_eq!(reset.stage(), ResetStage::AwaitingOtp);
    }

    #[test]
    fn test_malformed_code_rejected_before_compare() {
        let (mut reset, now) = flow();
        for input in ["48291", "4829130", "48291a", "", "４８２９１３"] {
            assert_eq!(reset.submit_otp(input, now), Err(ResetError::InvalidFormat));
        }
        assert_eq!(reset.stage(), ResetStage::AwaitingOtp);
    }

    #[test]
    fn test_padded_code_is_malformed() {
        let (mut reset, now) = flow();
        for input in [" 482913 ", "482913\n", "\t482913"] {
            assert_eq!(reset.submit_otp(input, now), Err(ResetError::InvalidFormat));
        }
        assert_eq!(reset.stage(), ResetStage::AwaitingOtp);
    }

    #[test]
    fn test_expired_code() {
        let (mut reset, now) = flow();
        let later = now + Duration::minutes(OTP_TTL_MINUTES + 1);
        assert_eq!(reset.submit_otp("482913", later), Err(ResetError::Expired));
        assert_eq!(reset.stage(), ResetStage::AwaitingOtp);
    }

    #[test]
    fn test_matching_passwords_build_submission() {
        let (mut reset, now) = flow();
        reset.submit_otp("482913", now).unwrap();

        let submission = reset.submission("Abc123", "Abc123").unwrap();
        assert_eq!(
            submission,
            ResetSubmission {
                email: "neo@matrix.io".into(),
                otp: "482913".into(),
                password: "Abc123".into(),
            }
        );
    }

    #[test]
    fn test_mismatched_passwords_blocked() {
        let (mut reset, now) = flow();
        reset.submit_otp("482913", now).unwrap();

        let err = reset.submission("Abc123", "Abc124").unwrap_err();
        assert_eq!(err, ResetError::PasswordsDoNotMatch);
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_empty_password_blocked() {
        let (mut reset, now) = flow();
        reset.submit_otp("482913", now).unwrap();

        assert_eq!(reset.submission("", ""), Err(ResetError::EmptyPassword));
        assert_eq!(reset.submission("", "Abc123"), Err(ResetError::EmptyPassword));
        assert_eq!(reset.stage(), ResetStage::ChoosingPassword);
    }

    #[test]
    fn test_submission_requires_verified_code() {
        let (reset, _) = flow();
        assert_eq!(
            reset.submission("Abc123", "Abc123"),
            Err(ResetError::NotVerified)
        );
    }
}
