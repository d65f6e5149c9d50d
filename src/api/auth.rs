//! Back-office session: a single credential exchanged for a fixed cookie.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::extract::JsonBody;
use super::response::ApiResponse;
use super::AppState;
use crate::{Result, StorefrontError};

pub const SESSION_COOKIE: &str = "admin-auth-token";
const SESSION_MAX_AGE_SECS: u32 = 60 * 60 * 24;

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn session_cookie(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}"
    ))
    .ok()
}

fn cleared_cookie() -> HeaderValue {
    HeaderValue::from_static("admin-auth-token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Guards every back-office route except login and logout.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let rejection = match cookie_value(request.headers(), SESSION_COOKIE) {
        None | Some("") => Some(("Authentication required", true)),
        Some(token) if token != state.admin.token => Some(("Invalid authentication token", false)),
        Some(_) => None,
    };
    let Some((reason, clear_cookie)) = rejection else {
        return next.run(request).await;
    };

    tracing::warn!(path = %request.uri().path(), reason, "admin request rejected");
    let mut response = StorefrontError::Unauthorized(reason).into_response();
    if clear_cookie {
        response.headers_mut().insert(header::SET_COOKIE, cleared_cookie());
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(State(state): State<AppState>, JsonBody(creds): JsonBody<Credentials>) -> Result<Response> {
    if creds.username != state.admin.username || creds.password != state.admin.password {
        tracing::warn!(username = %creds.username, "failed admin login");
        return Err(StorefrontError::Unauthorized("Invalid username or password"));
    }
    let cookie = session_cookie(&state.admin.token)
        .ok_or_else(|| StorefrontError::Storage("session token is not a valid header value".into()))?;
    tracing::info!(username = %creds.username, "admin logged in");

    let mut response = ApiResponse::done("Logged in").into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn logout() -> Response {
    let mut response = ApiResponse::done("Logged out").into_response();
    response.headers_mut().insert(header::SET_COOKIE, cleared_cookie());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; admin-auth-token=abc"));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
