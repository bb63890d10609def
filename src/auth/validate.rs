//! Local checks for usernames and passwords, run before anything is sent.
//! Same rules and messages as the backend validators.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username cannot contain any spaces")]
    UsernameHasSpaces,
    #[error("Username cannot be empty")]
    EmptyUsername,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Password Must contain at least 1 number, 1 uppercase character, and 1 special character")]
    PasswordTooWeak,
}

const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if username.contains(' ') {
        return Err(ValidationError::UsernameHasSpaces);
    }
    Ok(())
}

/// Anything that is not an ASCII digit, uppercase or lowercase letter
/// counts as special.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }

    let digit = password.chars().any(|c| c.is_ascii_digit());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if digit && upper && special {
        Ok(())
    } else {
        Err(ValidationError::PasswordTooWeak)
    }
}
