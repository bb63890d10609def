//! Session state: the current user and the operations that change it
//!
//! `Loading` until the first profile fetch resolves, then `Authenticated`
//! or `Anonymous`. Every server-calling method logs and returns its failure;
//! only [`Session::mount`] swallows it.

use async_trait::async_trait;
use std::future::Future;
use std::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use super::cookies::{CookieJar, SESSION_COOKIES};
use super::sanitize::sanitize;
use crate::api::ApiError;
use crate::models::{Credentials, ProfileResponse, ProfileUpdate, Role, SessionUser};

/// Root location, target of logout and of plain users.
pub const ROOT_PATH: &str = "/";

/// Server calls the session depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn me(&self) -> Result<ProfileResponse, ApiError>;
    async fn update_me(&self, update: &ProfileUpdate) -> Result<(), ApiError>;
}

/// Where the client currently "is", and how to move it
pub trait Navigator: Send {
    fn current_path(&self) -> String;
    fn navigate(&mut self, path: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(SessionUser),
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Landing path for a role. Unknown or absent roles land on `/`.
pub fn redirect_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Superadmin) => "/superadmin",
        Some(Role::Admin) => "/admin",
        Some(Role::User) | None => ROOT_PATH,
    }
}

/// Why a role-gated operation was refused
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("session is still loading")]
    Loading,
    #[error("not signed in. Run 'cedrik login' first.")]
    NotSignedIn,
    #[error("role '{0}' is not allowed here")]
    Forbidden(Role),
}

/// Build the session user from `/auth/me`, sanitizing the free-text fields.
fn user_from_profile(profile: ProfileResponse) -> SessionUser {
    let role = Role::from_claim(&profile.aud).unwrap_or_else(|| {
        tracing::warn!("Unknown role claim {:?}, treating as user", profile.aud);
        Role::User
    });
    SessionUser {
        id: profile.id.unwrap_or_default(),
        email: sanitize(&profile.email),
        username: sanitize(&profile.username),
        role,
    }
}

/// Resolve `fut` unless `token` is cancelled first.
async fn guarded<T, F>(token: &CancellationToken, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}

pub struct Session<A, N> {
    api: A,
    navigator: Mutex<N>,
    jar: CookieJar,
    state: RwLock<SessionState>,
    inflight: Mutex<CancellationToken>,
}

impl<A: AuthApi, N: Navigator> Session<A, N> {
    pub fn new(api: A, navigator: N, jar: CookieJar) -> Self {
        Self {
            api,
            navigator: Mutex::new(navigator),
            jar,
            state: RwLock::new(SessionState::Loading),
            inflight: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state().user().cloned()
    }

    pub fn current_path(&self) -> String {
        self.navigator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current_path()
    }

    /// The signed-in user, if their role is in `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<SessionUser, AccessError> {
        match self.state() {
            SessionState::Loading => Err(AccessError::Loading),
            SessionState::Anonymous => Err(AccessError::NotSignedIn),
            SessionState::Authenticated(user) if allowed.contains(&user.role) => Ok(user),
            SessionState::Authenticated(user) => Err(AccessError::Forbidden(user.role)),
        }
    }

    /// Initial profile fetch. Failure just means there is no session.
    pub async fn mount(&self) {
        let token = self.begin_request();
        match self.fetch_and_redirect(&token).await {
            Ok(user) => tracing::debug!("Session restored for {}", user.email),
            Err(ApiError::Cancelled) => tracing::debug!("Initial profile fetch superseded"),
            Err(e) => tracing::debug!("No session on startup: {}", e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let token = self.begin_request();
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        if let Err(e) = guarded(&token, self.api.login(&credentials)).await {
            tracing::error!("Login failed: {}", e);
            if !token.is_cancelled() {
                self.settle_anonymous_if_loading();
            }
            return Err(e);
        }

        self.fetch_and_redirect(&token).await.map_err(|e| {
            tracing::error!("Login failed: {}", e);
            e
        })
    }

    /// Log out on the server (best effort), then always drop the local
    /// session and go back to `/`. A server failure is returned afterwards.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let token = self.begin_request();
        let result = guarded(&token, self.api.logout()).await;
        if let Err(e) = &result {
            tracing::error!("Logout failed: {}", e);
        }

        self.clear_client_storage();
        self.set_state(SessionState::Anonymous);
        self.navigate(ROOT_PATH);
        result
    }

    /// Update the profile on the server, then resync the local user.
    pub async fn update_user(&self, update: &ProfileUpdate) -> Result<SessionUser, ApiError> {
        let token = self.begin_request();
        if let Err(e) = guarded(&token, self.api.update_me(update)).await {
            tracing::error!("Update user failed: {}", e);
            return Err(e);
        }
        self.fetch_and_redirect(&token).await.map_err(|e| {
            tracing::error!("Update user failed: {}", e);
            e
        })
    }

    pub async fn refresh_user(&self) -> Result<SessionUser, ApiError> {
        let token = self.begin_request();
        self.fetch_and_redirect(&token).await.map_err(|e| {
            tracing::error!("Failed to fetch user data: {}", e);
            e
        })
    }

    /// Cancel whatever session request is in flight and start a new scope.
    fn begin_request(&self) -> CancellationToken {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight.cancel();
        *inflight = CancellationToken::new();
        inflight.clone()
    }

    async fn fetch_and_redirect(&self, token: &CancellationToken) -> Result<SessionUser, ApiError> {
        let profile = guarded(token, self.api.me()).await;
        if token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        match profile {
            Ok(profile) => {
                let user = user_from_profile(profile);
                self.set_state(SessionState::Authenticated(user.clone()));

                let target = redirect_path(Some(user.role));
                if self.current_path() != target {
                    self.navigate(target);
                }
                Ok(user)
            }
            Err(e) => {
                self.set_state(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    fn clear_client_storage(&self) {
        for name in SESSION_COOKIES {
            if !self.jar.expire(name) {
                tracing::debug!("Cookie {} was already absent", name);
            }
        }
        self.jar.clear();
    }

    fn settle_anonymous_if_loading(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state == SessionState::Loading {
            *state = SessionState::Anonymous;
        }
    }

    fn set_state(&self, next: SessionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn navigate(&self, path: &str) {
        self.navigator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .navigate(path);
    }
}
