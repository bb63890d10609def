//! Authentication for the CEDRIK backend
//!
//! The backend keeps the session in cookies (JWT access/refresh tokens plus a
//! CSRF token). This module owns the cookie jar, the session state built on
//! top of it, and the forgot-password flow.

pub mod cookies;
pub mod reset;
pub mod sanitize;
pub mod session;
pub mod validate;

pub use cookies::{CookieJar, StoredCookie};
pub use reset::{OtpChallenge, PasswordReset, ResetError, ResetStage};
pub use session::{AuthApi, Navigator, Session};
pub use validate::{validate_password, validate_username};
