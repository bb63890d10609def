//! Cookie jar shared by the backend client
//!
//! The backend keeps the session in cookies (`access_token_cookie`,
//! `refresh_token_cookie`) and publishes a readable `csrf_access_token`
//! whose value must be echoed back in a request header. The jar is
//! persisted in the config file between invocations.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Cookie carrying the CSRF double-submit token
pub const CSRF_COOKIE: &str = "csrf_access_token";
/// Cookie carrying the session JWT
pub const ACCESS_COOKIE: &str = "access_token_cookie";
/// Cookie carrying the refresh JWT
pub const REFRESH_COOKIE: &str = "refresh_token_cookie";

/// Cookies removed on logout
pub const SESSION_COOKIES: [&str; 3] = [CSRF_COOKIE, ACCESS_COOKIE, REFRESH_COOKIE];

/// Stored cookie value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    /// Unix seconds; `None` for session cookies
    pub expires_at: Option<i64>,
}

impl StoredCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }
}

/// Thread-safe cookie jar, cheap to clone.
///
/// Single-origin: only the backend client carries a jar, so `Domain` and
/// `Path` attributes are ignored and every live cookie goes with every
/// request. Do not share a jar across hosts.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<BTreeMap<String, StoredCookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a jar from its persisted form, dropping expired entries.
    pub fn from_stored(stored: BTreeMap<String, StoredCookie>) -> Self {
        let now = Utc::now().timestamp();
        let live = stored
            .into_iter()
            .filter(|(_, c)| !c.is_expired_at(now))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(live)),
        }
    }

    /// Copy of the live cookies for persistence.
    pub fn snapshot(&self) -> BTreeMap<String, StoredCookie> {
        let now = Utc::now().timestamp();
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .filter(|(_, c)| !c.is_expired_at(now))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now().timestamp();
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .get(name)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.value.clone())
    }

    pub fn insert(&self, name: impl Into<String>, cookie: StoredCookie) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(name.into(), cookie);
    }

    /// Remove a cookie. Returns whether it was present.
    pub fn expire(&self, name: &str) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(name).is_some()
    }

    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    pub fn is_empty(&self) -> bool {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.is_empty()
    }

    /// Apply one `Set-Cookie` header line.
    pub fn apply_set_cookie(&self, header: &str) {
        let now = Utc::now().timestamp();
        match parse_set_cookie(header, now) {
            Some((name, Some(cookie))) => {
                tracing::debug!("Cookie set: {}", name);
                self.insert(name, cookie);
            }
            Some((name, None)) => {
                tracing::debug!("Cookie expired by server: {}", name);
                self.expire(&name);
            }
            None => tracing::debug!("Ignoring malformed Set-Cookie header"),
        }
    }

    /// Percent-decoded CSRF token, if the cookie exists and decodes.
    pub fn csrf_token(&self) -> Option<String> {
        let raw = self.get(CSRF_COOKIE)?;
        match urlencoding::decode(&raw) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(e) => {
                tracing::debug!("CSRF cookie is not valid UTF-8 after decoding: {}", e);
                None
            }
        }
    }

    /// `Cookie` request header value for all live cookies.
    fn header_value(&self) -> Option<String> {
        let now = Utc::now().timestamp();
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let pairs: Vec<String> = guard
            .iter()
            .filter(|(_, c)| !c.is_expired_at(now))
            .map(|(k, c)| format!("{}={}", k, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &url::Url) {
        for header in cookie_headers {
            match header.to_str() {
                Ok(s) => self.apply_set_cookie(s),
                Err(_) => tracing::debug!("Ignoring non-ASCII Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, _url: &url::Url) -> Option<HeaderValue> {
        self.header_value()
            .and_then(|v| HeaderValue::from_str(&v).ok())
    }
}

/// Parse a `Set-Cookie` line into `(name, cookie)`.
///
/// A `None` cookie means the server asked for removal (`Max-Age<=0` or an
/// `Expires` in the past). Returns `None` if the line has no `name=value`.
pub fn parse_set_cookie(header: &str, now: i64) -> Option<(String, Option<StoredCookie>)> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"').to_string();

    let mut expires_at: Option<i64> = None;
    let mut max_age: Option<i64> = None;
    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attr.trim(), ""),
        };
        if key.eq_ignore_ascii_case("max-age") {
            max_age = val.parse().ok();
        } else if key.eq_ignore_ascii_case("expires") {
            expires_at = DateTime::parse_from_rfc2822(val)
                .ok()
                .map(|dt| dt.timestamp());
        }
    }

    // Max-Age takes precedence over Expires
    let expires_at = match max_age {
        Some(secs) => Some(now + secs),
        None => expires_at,
    };

    if matches!(expires_at, Some(exp) if exp <= now) {
        return Some((name.to_string(), None));
    }

    Some((name.to_string(), Some(StoredCookie { value, expires_at })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn test_csrf_token_is_percent_decoded() {
        let jar = CookieJar::new();
        jar.insert(CSRF_COOKIE, StoredCookie::new("abc%2Bdef"));
        assert_eq!(jar.csrf_token().as_deref(), Some("abc+def"));
    }

    #[test]
    fn test_csrf_token_absent() {
        let jar = CookieJar::new();
        assert_eq!(jar.csrf_token(), None);
    }

    #[test]
    fn test_csrf_token_invalid_utf8_is_skipped() {
        let jar = CookieJar::new();
        jar.insert(CSRF_COOKIE, StoredCookie::new("%FF%FE"));
        assert_eq!(jar.csrf_token(), None);
    }

    #[test]
    fn test_parse_set_cookie_plain() {
        let (name, cookie) =
            parse_set_cookie("csrf_access_token=abc%2Bdef; Path=/; SameSite=Lax", NOW).unwrap();
        assert_eq!(name, "csrf_access_token");
        let cookie = cookie.unwrap();
        assert_eq!(cookie.value, "abc%2Bdef");
        assert_eq!(cookie.expires_at, None);
    }

    #[test]
    fn test_parse_set_cookie_max_age() {
        let (_, cookie) = parse_set_cookie("a=b; Max-Age=60; HttpOnly", NOW).unwrap();
        assert_eq!(cookie.unwrap().expires_at, Some(NOW + 60));
    }

    #[test]
    fn test_parse_set_cookie_removal() {
        let (name, cookie) = parse_set_cookie(
            "access_token_cookie=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
            NOW,
        )
        .unwrap();
        assert_eq!(name, "access_token_cookie");
        assert!(cookie.is_none());

        let (_, cookie) = parse_set_cookie("a=b; Max-Age=0", NOW).unwrap();
        assert!(cookie.is_none());
    }

    #[test]
    fn test_parse_set_cookie_malformed() {
        assert!(parse_set_cookie("no-equals-sign", NOW).is_none());
        assert!(parse_set_cookie("=value", NOW).is_none());
    }

    #[test]
    fn test_expire_session_cookies() {
        let jar = CookieJar::new();
        for name in SESSION_COOKIES {
            jar.insert(name, StoredCookie::new("x"));
        }
        jar.insert("theme", StoredCookie::new("dark"));

        for name in SESSION_COOKIES {
            assert!(jar.expire(name));
        }
        // Expiring twice is harmless
        assert!(!jar.expire(CSRF_COOKIE));
        assert_eq!(jar.snapshot().len(), 1);
    }

    #[test]
    fn test_cookie_store_roundtrip_through_reqwest_trait() {
        let jar = CookieJar::new();
        let url = url::Url::parse("http://localhost:5000/auth/login").unwrap();
        let headers = [
            HeaderValue::from_static("access_token_cookie=jwt; HttpOnly; Path=/"),
            HeaderValue::from_static("csrf_access_token=tok; Path=/"),
        ];
        jar.set_cookies(&mut headers.iter(), &url);

        let header = jar.cookies(&url).unwrap();
        assert_eq!(
            header.to_str().unwrap(),
            "access_token_cookie=jwt; csrf_access_token=tok"
        );
    }

    #[test]
    fn test_from_stored_drops_expired() {
        let mut stored = BTreeMap::new();
        stored.insert(
            "old".to_string(),
            StoredCookie {
                value: "v".into(),
                expires_at: Some(1),
            },
        );
        stored.insert("live".to_string(), StoredCookie::new("v"));
        let jar = CookieJar::from_stored(stored);
        assert_eq!(jar.get("old"), None);
        assert_eq!(jar.get("live").as_deref(), Some("v"));
    }

    #[test]
    fn test_domain_and_path_are_ignored() {
        let jar = CookieJar::new();
        let login = url::Url::parse("http://localhost:5000/auth/login").unwrap();
        let header = HeaderValue::from_static("access_token_cookie=jwt; Domain=other.host; Path=/auth");
        jar.set_cookies(&mut std::iter::once(&header), &login);

        let elsewhere = url::Url::parse("http://localhost:5000/conversation/get").unwrap();
        assert_eq!(jar.cookies(&elsewhere).unwrap(), "access_token_cookie=jwt");
    }
}
