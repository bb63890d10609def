//! Account commands: sign-up, sign-in, profile, password reset, user listing

use anyhow::{bail, Result};
use chrono::Utc;

use super::{prompt, prompt_secret, secret_or_prompt, signed_in, value_or_prompt};
use crate::api::{auth, password};
use crate::app::App;
use crate::auth::reset::OTP_TTL_MINUTES;
use crate::auth::{
    validate_password, validate_username, OtpChallenge, PasswordReset, ResetError, ResetStage,
};
use crate::models::{ProfileUpdate, Registration, Role};
use crate::notify::Notice;

pub async fn register(
    app: &App,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = value_or_prompt(username, "Username")?;
    validate_username(&username)?;
    let email = value_or_prompt(email, "Email")?;
    let password = secret_or_prompt(password, "Password")?;
    validate_password(&password)?;

    let registration = Registration {
        username,
        email,
        password,
    };
    auth::register(app.backend()?, &registration).await?;

    Notice::success(
        "Account created",
        format!("You can now sign in as {}", registration.email),
    )
    .print();
    Ok(())
}

pub async fn login(app: &App, email: Option<String>, password: Option<String>) -> Result<()> {
    let session = app.session()?;
    let email = value_or_prompt(email, "Email")?;
    let password = secret_or_prompt(password, "Password")?;

    let user = session.login(&email, &password).await?;
    Notice::success(
        "Welcome",
        format!("Signed in as {} ({})", user.username, user.role),
    )
    .print();
    println!("Location: {}", session.current_path());
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    let session = app.session()?;
    let result = session.logout().await;
    // Local state is gone either way
    Notice::success("Logged out", "Session cleared").print();
    result?;
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let session = app.session()?;
    let Some(user) = session.user() else {
        println!("Not signed in. Run 'cedrik login' first.");
        return Ok(());
    };

    println!();
    println!("Username: {}", user.username);
    println!("Email:    {}", user.email);
    println!("Role:     {}", user.role);
    println!("ID:       {}", user.id);
    println!("Location: {}", session.current_path());
    Ok(())
}

pub async fn update_profile(
    app: &App,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    signed_in(app)?;

    if let Some(name) = &username {
        validate_username(name)?;
    }
    if let Some(pw) = &password {
        validate_password(pw)?;
    }
    let update = ProfileUpdate { username, password };
    if update.is_empty() {
        bail!("Nothing to update. Pass --username and/or --password.");
    }

    let user = app.session()?.update_user(&update).await?;
    Notice::success("Profile updated", format!("Now signed in as {}", user.username)).print();
    Ok(())
}

/// Email a one-time code, check it locally, then set a new password.
pub async fn forgot_password(app: &App, email: Option<String>) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    let challenge = OtpChallenge::generate(Utc::now());

    let email_client = app.email_client()?;
    password::request_otp(
        &email_client,
        &app.config().email(),
        &email,
        challenge.code(),
        OTP_TTL_MINUTES,
    )
    .await?;
    Notice::success("Code sent", format!("Check {} for a 6-digit code", email)).print();

    let mut flow = PasswordReset::new(email, challenge);
    println!(
        "The code is valid until {}.",
        flow.challenge()
            .expires_at()
            .with_timezone(&chrono::Local)
            .format("%H:%M")
    );
    while flow.stage() == ResetStage::AwaitingOtp {
        let input = prompt("6-digit code")?;
        match flow.submit_otp(&input, Utc::now()) {
            Ok(()) => {}
            Err(ResetError::Expired) => return Err(ResetError::Expired.into()),
            Err(e) => Notice::error("Error", e.to_string()).print(),
        }
    }
    Notice::success("OTP Verified", "You can now reset your password.").print();

    let submission = loop {
        let new_password = prompt_secret("New password")?;
        let confirm = prompt_secret("Confirm password")?;
        match flow.submission(&new_password, &confirm) {
            Ok(submission) => break submission,
            Err(e) => Notice::error("Error", e.to_string()).print(),
        }
    };

    password::reset_password(
        app.backend()?,
        &submission.email,
        &submission.otp,
        &submission.password,
    )
    .await?;
    Notice::success(
        "Password reset",
        format!("Sign in as {} with your new password.", flow.email()),
    )
    .print();
    Ok(())
}

pub async fn list_users(app: &App, page: u32, max_items: u32) -> Result<()> {
    app.session()?.require_role(&[Role::Admin, Role::Superadmin])?;

    let result = auth::list_users(app.backend()?, page, max_items).await?;

    println!("\nUsers (page {}, {} total):", result.page, result.total);
    println!("{:-<60}", "");

    if result.items.is_empty() {
        println!("  (no users found)");
        return Ok(());
    }

    for user in &result.items {
        let status = if user.is_active { "" } else { " [archived]" };
        println!("{}{}", user.username, status);
        println!("  Email: {}", user.email);
        println!("  Role:  {}", user.role.as_deref().unwrap_or("user"));
        println!("  ID:    {}", user.id);
        if let Some(created) = user.created_at.as_deref() {
            println!("  Since: {}", created);
        }
        if let Some(updated) = user.updated_at.as_deref() {
            println!("  Updated: {}", updated);
        }
        println!();
    }

    Ok(())
}
