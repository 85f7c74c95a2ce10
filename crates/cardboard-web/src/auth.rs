//! Password login and the session cookie
//!
//! A successful `POST /api/authenticate` sets `auth-token=authenticated`;
//! `check-auth` and the optional API gate only look at that cookie.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::router::AppState;

pub const AUTH_COOKIE: &str = "auth-token";
pub const AUTH_COOKIE_VALUE: &str = "authenticated";
/// 30 days
pub const SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Environment variables read by the binary's `web` flags
pub const ENV_AUTH_PASSWORD: &str = "AUTH_PASSWORD";
pub const ENV_SECURE_COOKIE: &str = "CARDBOARD_SECURE_COOKIE";
pub const ENV_PROTECT_API: &str = "CARDBOARD_PROTECT_API";

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Dashboard password; without one, login answers 500
    pub password: Option<String>,
    /// Add `Secure` to the session cookie
    pub secure_cookie: bool,
    /// Require the session cookie on card and board routes
    pub protect_api: bool,
}

impl AuthConfig {
    fn session_cookie(&self) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Strict; Max-Age={}; Path=/",
            AUTH_COOKIE, AUTH_COOKIE_VALUE, SESSION_MAX_AGE_SECS
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn expired_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; HttpOnly; SameSite=Strict; Max-Age=0; Path=/",
            AUTH_COOKIE
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of a cookie across every `Cookie` header of the request
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn has_session(headers: &HeaderMap) -> bool {
    cookie_value(headers, AUTH_COOKIE) == Some(AUTH_COOKIE_VALUE)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub password: Option<String>,
}

/// POST /api/authenticate
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Response {
    let Some(expected) = state.auth.password.as_deref() else {
        warn!("Login attempted but no dashboard password is configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "authenticated": false, "message": "Server error." })),
        )
            .into_response();
    };

    let password = payload.ok().and_then(|Json(body)| body.password);
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "authenticated": false, "message": "Password not provided." })),
        )
            .into_response();
    };

    if !constant_time_eq(password.as_bytes(), expected.as_bytes()) {
        warn!("Rejected login with wrong password");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response();
    }

    info!("Dashboard login succeeded");
    with_cookie(
        Json(json!({ "authenticated": true })).into_response(),
        state.auth.session_cookie(),
    )
}

/// GET /api/check-auth
pub async fn check_auth(headers: HeaderMap) -> Json<serde_json::Value> {
    Json(json!({ "authenticated": has_session(&headers) }))
}

/// POST /api/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    with_cookie(
        Json(json!({ "authenticated": false })).into_response(),
        state.auth.expired_cookie(),
    )
}

/// Gate for card and board routes when `protect_api` is on
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth.protect_api && !has_session(request.headers()) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = AuthConfig {
            password: Some("pw".to_string()),
            ..AuthConfig::default()
        };
        assert_eq!(
            config.session_cookie(),
            "auth-token=authenticated; HttpOnly; SameSite=Strict; Max-Age=2592000; Path=/"
        );
        config.secure_cookie = true;
        assert!(config.session_cookie().ends_with("; Secure"));
        assert!(config.expired_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("lang=en; auth-token=authenticated"),
        );

        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert!(has_session(&headers));
    }

    #[test]
    fn test_wrong_cookie_value_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("auth-token=yes"));
        assert!(!has_session(&headers));
        assert!(!has_session(&HeaderMap::new()));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }
}
