//! Auth endpoints (/auth/*) and admin user listing

use async_trait::async_trait;

use super::client::{read_json, ApiClient};
use super::error::ApiError;
use crate::auth::AuthApi;
use crate::models::{Credentials, ProfileResponse, ProfileUpdate, Registration, UserPage};

/// `POST /auth/register`
pub async fn register(client: &ApiClient, registration: &Registration) -> Result<(), ApiError> {
    tracing::info!("Registering {}", registration.email);
    client.post_json("/auth/register", registration).await?;
    Ok(())
}

/// `POST /auth/login`. The session arrives as cookies in the jar; the body
/// is empty.
pub async fn login(client: &ApiClient, credentials: &Credentials) -> Result<(), ApiError> {
    tracing::info!("Signing in as {}", credentials.email);
    client.post_json("/auth/login", credentials).await?;
    Ok(())
}

/// `GET /auth/logout`. The server answers with expired cookies.
pub async fn logout(client: &ApiClient) -> Result<(), ApiError> {
    client.get("/auth/logout").await?;
    Ok(())
}

/// `GET /auth/me`
pub async fn me(client: &ApiClient) -> Result<ProfileResponse, ApiError> {
    let resp = client.get("/auth/me").await?;
    read_json(resp).await
}

/// `PUT /auth/me`. Fresh claims are read back through `/auth/me`.
pub async fn update_me(client: &ApiClient, update: &ProfileUpdate) -> Result<(), ApiError> {
    client.put_json("/auth/me", update).await?;
    Ok(())
}

/// `GET /user/get` (admin only)
pub async fn list_users(
    client: &ApiClient,
    page: u32,
    max_items: u32,
) -> Result<UserPage, ApiError> {
    let query = [("page", page), ("maxItems", max_items)];
    let resp = client.get_query("/user/get", &query).await?;
    read_json(resp).await
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        login(self, credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        logout(self).await
    }

    async fn me(&self) -> Result<ProfileResponse, ApiError> {
        me(self).await
    }

    async fn update_me(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        update_me(self, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{response, serve};
    use crate::app::Location;
    use crate::auth::{CookieJar, Session};
    use crate::models::Role;
    use std::time::Duration;

    #[tokio::test]
    async fn test_login_with_empty_body_signs_in() {
        let (base, mut seen) = serve(vec![
            response(
                "200 OK",
                &[
                    "Set-Cookie: access_token_cookie=jwt; HttpOnly; Path=/",
                    "Set-Cookie: csrf_access_token=tok; Path=/",
                ],
                "",
            ),
            response(
                "200 OK",
                &["Content-Type: application/json"],
                r#"{"id": "65f0c0ffee", "aud": "admin", "username": "neo", "email": "neo@matrix.io"}"#,
            ),
        ])
        .await;
        let jar = CookieJar::new();
        let client = ApiClient::backend(&base, jar.clone(), Duration::from_secs(5)).unwrap();
        let session = Session::new(client, Location::new(None), jar.clone());

        let user = session.login("neo@matrix.io", "Abc123!x").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(session.user(), Some(user));
        assert_eq!(session.current_path(), "/admin");
        assert_eq!(jar.csrf_token().as_deref(), Some("tok"));

        let login = seen.recv().await.unwrap();
        assert!(login.request_line().starts_with("POST /auth/login "));
        let body: serde_json::Value = serde_json::from_slice(&login.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "email": "neo@matrix.io", "password": "Abc123!x" })
        );

        // The profile fetch carries the fresh session
        let me = seen.recv().await.unwrap();
        assert!(me.request_line().starts_with("GET /auth/me "));
        assert_eq!(me.header("x-csrf-token"), Some("tok"));
        assert!(me.header("cookie").unwrap().contains("access_token_cookie=jwt"));
    }

    #[tokio::test]
    async fn test_update_me_ignores_body() {
        let (base, mut seen) = serve(vec![response("200 OK", &[], "")]).await;
        let client = ApiClient::backend(&base, CookieJar::new(), Duration::from_secs(5)).unwrap();

        let update = ProfileUpdate {
            username: Some("trinity".to_string()),
            password: None,
        };
        update_me(&client, &update).await.unwrap();

        let req = seen.recv().await.unwrap();
        assert!(req.request_line().starts_with("PUT /auth/me "));
        assert_eq!(req.body_text(), r#"{"username":"trinity"}"#);
    }
}
