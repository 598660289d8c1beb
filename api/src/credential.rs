//! Session cookie encoding.
//!
//! The cookie carries the session secret base64-encoded (URL-safe, no
//! padding). Whatever issues the cookie uses [`SessionCookie::encode`].

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::debug;

use crate::error::ApiError;

pub const DEFAULT_COOKIE_NAME: &str = "login";

#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl SessionCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pulls the session secret out of the request's cookies.
    ///
    /// `Ok(None)` when the cookie is absent. A cookie that does not decode to
    /// a non-empty UTF-8 secret is a malformed credential.
    pub fn secret_from_headers(&self, headers: &HeaderMap) -> Result<Option<String>, ApiError> {
        let jar = CookieJar::from_headers(headers);
        let Some(cookie) = jar.get(&self.name) else {
            return Ok(None);
        };

        let bytes = URL_SAFE_NO_PAD.decode(cookie.value()).map_err(|e| {
            debug!(cookie = %self.name, "Cookie is not valid base64: {}", e);
            ApiError::MalformedCredential
        })?;
        let secret = String::from_utf8(bytes).map_err(|_| ApiError::MalformedCredential)?;
        if secret.is_empty() {
            return Err(ApiError::MalformedCredential);
        }

        Ok(Some(secret))
    }

    /// Encodes a session secret as a cookie value.
    pub fn encode(secret: &str) -> String {
        URL_SAFE_NO_PAD.encode(secret.as_bytes())
    }

    /// Builds the `Set-Cookie` form of a session secret.
    pub fn to_cookie(&self, secret: &str) -> Cookie<'static> {
        Cookie::build((self.name.clone(), Self::encode(secret)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_missing_cookie_is_none() {
        let cookie = SessionCookie::default();
        assert!(cookie.secret_from_headers(&HeaderMap::new()).unwrap().is_none());

        let headers = headers_with("theme=dark");
        assert!(cookie.secret_from_headers(&headers).unwrap().is_none());
    }

    #[test]
    fn test_decodes_secret() {
        let cookie = SessionCookie::default();
        let value = SessionCookie::encode("abc-123_secret");
        let headers = headers_with(&format!("theme=dark; login={}", value));

        assert_eq!(
            cookie.secret_from_headers(&headers).unwrap().as_deref(),
            Some("abc-123_secret")
        );
    }

    #[test]
    fn test_garbage_cookie_is_malformed() {
        let cookie = SessionCookie::default();
        let headers = headers_with("login=not*base64!");
        assert!(matches!(
            cookie.secret_from_headers(&headers),
            Err(ApiError::MalformedCredential)
        ));
    }

    #[test]
    fn test_empty_cookie_is_malformed() {
        let cookie = SessionCookie::default();
        let headers = headers_with("login=");
        assert!(matches!(
            cookie.secret_from_headers(&headers),
            Err(ApiError::MalformedCredential)
        ));
    }

    #[test]
    fn test_custom_name() {
        let cookie = SessionCookie::new("sid");
        let headers = headers_with(&format!("sid={}", SessionCookie::encode("s3")));
        assert_eq!(cookie.secret_from_headers(&headers).unwrap().as_deref(), Some("s3"));

        let set = cookie.to_cookie("s3");
        assert_eq!(set.name(), "sid");
        assert_eq!(set.http_only(), Some(true));
    }
}
