//! CLI command implementations. Each prints its own output.

pub mod account;
pub mod chat;
pub mod labs;

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};

use crate::app::App;
use crate::models::{Role, SessionUser};

const ANY_ROLE: [Role; 3] = [Role::User, Role::Admin, Role::Superadmin];

/// Read one trimmed line from stdin after printing `label`.
pub(crate) fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    if read == 0 {
        bail!("Input closed");
    }
    Ok(input.trim().to_string())
}

/// Use the flag value if given, otherwise ask for it.
pub(crate) fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => prompt(label),
    }
}

/// Read a secret from the terminal without echo. Taken verbatim.
pub(crate) fn prompt_secret(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

/// Use the flag value if given, otherwise ask for it without echo.
pub(crate) fn secret_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => prompt_secret(label),
    }
}

/// The signed-in user, whatever their role.
pub(crate) fn signed_in(app: &App) -> Result<SessionUser> {
    Ok(app.session()?.require_role(&ANY_ROLE)?)
}
