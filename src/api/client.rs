//! Shared HTTP client for the CEDRIK services
//!
//! Wraps reqwest::Client with cookie credentials, CSRF header injection and
//! failure normalisation into [`ApiError`].

use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use crate::auth::CookieJar;

/// Header the backend checks against the CSRF cookie
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Which service a client talks to; selects failure diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Backend,
    Labs,
    Email,
}

impl Service {
    fn label(&self) -> &'static str {
        match self {
            Service::Backend => "Backend",
            Service::Labs => "Labs API",
            Service::Email => "Email service",
        }
    }
}

/// Request client bound to one base URL.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    jar: Option<CookieJar>,
    service: Service,
}

impl ApiClient {
    /// Backend client: sends cookies from `jar` and echoes the CSRF token.
    pub fn backend(base_url: &str, jar: CookieJar, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar.clone()))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            jar: Some(jar),
            service: Service::Backend,
        })
    }

    /// Labs client: no cookies, no CSRF.
    pub fn labs(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Self::without_cookies(base_url, Service::Labs, timeout)
    }

    /// Third-party email relay client.
    pub fn email(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Self::without_cookies(base_url, Service::Email, timeout)
    }

    fn without_cookies(base_url: &str, service: Service, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            jar: None,
            service,
        })
    }

    pub fn jar(&self) -> Option<&CookieJar> {
        self.jar.as_ref()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the CSRF header already attached.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.jar {
            Some(jar) => with_csrf(builder, jar),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, ApiError> {
        self.send(Method::GET, path, self.request(Method::GET, path))
            .await
    }

    pub async fn get_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Response, ApiError> {
        let builder = self.request(Method::GET, path).query(query);
        self.send(Method::GET, path, builder).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, builder).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(Method::PUT, path, builder).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response, ApiError> {
        let builder = self.request(Method::POST, path).multipart(form);
        self.send(Method::POST, path, builder).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        tracing::debug!("{} {} {}", self.service.label(), method, path);
        let resp = builder.send().await.map_err(|e| {
            tracing::debug!("{} {} {} failed: {}", self.service.label(), method, path, e);
            ApiError::Transport(e)
        })?;
        check_response(resp, self.service, path).await
    }
}

/// Attach the decoded CSRF cookie as a header. Never fails: a missing or
/// unusable token just leaves the request without the header.
pub fn with_csrf(builder: RequestBuilder, jar: &CookieJar) -> RequestBuilder {
    let Some(token) = jar.csrf_token() else {
        return builder;
    };
    match HeaderValue::from_str(&token) {
        Ok(value) => builder.header(CSRF_HEADER, value),
        Err(_) => {
            tracing::debug!("CSRF token is not a valid header value, sending without it");
            builder
        }
    }
}

/// Pass successes through; turn failures into [`ApiError`] after logging.
async fn check_response(
    resp: Response,
    service: Service,
    path: &str,
) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.bytes().await.unwrap_or_default();
    let err = ApiError::from_failure(status, &body);

    if err.is_unauthorized() {
        tracing::warn!(
            "Unauthorized request to {}: {}",
            path,
            err.server_message().as_deref().unwrap_or("no message")
        );
    }
    if service == Service::Labs {
        if status == StatusCode::NOT_FOUND {
            tracing::error!("Labs API: Resource not found ({})", path);
        } else if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Labs API: Server error ({})", path);
        }
    }

    Err(err)
}

/// Decode a JSON success body.
pub async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
