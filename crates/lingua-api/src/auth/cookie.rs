//! Refresh token cookie
//!
//! The raw refresh secret travels only in an `HttpOnly`, `SameSite=Strict`
//! cookie scoped to `/`.

use axum::http::{header, HeaderMap, HeaderValue};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie lifetime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieLifetime {
    /// `Max-Age` in seconds
    Persistent(i64),
    /// No `Max-Age`; dropped when the browser session ends
    Session,
    /// `Max-Age=0`; tells the client to delete the cookie
    Expired,
}

/// Build the `Set-Cookie` value carrying a refresh secret
pub fn refresh_cookie(value: &str, lifetime: CookieLifetime, secure: bool) -> HeaderValue {
    let mut cookie = format!("{REFRESH_COOKIE_NAME}={value}; HttpOnly");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; Path=/; SameSite=Strict");
    match lifetime {
        CookieLifetime::Persistent(secs) => cookie.push_str(&format!("; Max-Age={}", secs.max(0))),
        CookieLifetime::Session => {}
        CookieLifetime::Expired => cookie.push_str("; Max-Age=0"),
    }

    // Secrets are UUID text, so the value is always a legal header
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_refresh_cookie(secure))
}

/// `Set-Cookie` value that removes the refresh cookie
pub fn clear_refresh_cookie(secure: bool) -> HeaderValue {
    let cookie = if secure {
        "refreshToken=; HttpOnly; Secure; Path=/; SameSite=Strict; Max-Age=0"
    } else {
        "refreshToken=; HttpOnly; Path=/; SameSite=Strict; Max-Age=0"
    };
    HeaderValue::from_static(cookie)
}

/// Read a cookie by name from every `Cookie` header of a request
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}
