//! One-shot notices carried from a form POST to the next rendered page.
//!
//! Messages travel in a cookie holding an HS256 token signed with the session
//! secret. A cookie that fails verification or has expired is dropped.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Seconds a flash cookie stays valid
pub const FLASH_MAX_AGE: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub text: String,
}

impl Flash {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlashClaims {
    messages: Vec<Flash>,
    exp: i64,
}

pub struct FlashStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_name: String,
}

impl FlashStore {
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cookie_name: cookie_name.into(),
        }
    }

    /// Sign `messages` into a cookie value
    pub fn encode(&self, messages: &[Flash]) -> Option<String> {
        let claims = FlashClaims {
            messages: messages.to_vec(),
            exp: chrono::Utc::now().timestamp() + FLASH_MAX_AGE,
        };

        match encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Failed to sign flash messages: {}", e);
                None
            }
        }
    }

    pub fn decode(&self, token: &str) -> Vec<Flash> {
        match decode::<FlashClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)) {
            Ok(data) => data.claims.messages,
            Err(e) => {
                debug!("Ignoring invalid flash cookie: {}", e);
                Vec::new()
            }
        }
    }

    /// Messages carried by the request, or `None` when it has no flash cookie.
    pub fn take(&self, headers: &HeaderMap) -> Option<Vec<Flash>> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookies| cookie_value(cookies, &self.cookie_name))
            .map(|token| self.decode(token))
    }

    pub fn set_cookie(&self, messages: &[Flash]) -> Option<String> {
        self.encode(messages).map(|token| {
            format!(
                "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
                self.cookie_name, token, FLASH_MAX_AGE
            )
        })
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", self.cookie_name)
    }

    /// `303 See Other` to `to`, carrying `messages` for the next page.
    pub fn redirect(&self, messages: &[Flash], to: &str) -> Response {
        let mut response = Redirect::to(to).into_response();

        if let Some(cookie) = self.set_cookie(messages) {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("Flash cookie is not a valid header value: {}", e),
            }
        }

        response
    }
}

/// Find a cookie value by name in a `Cookie` header
fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|cookie| {
        let (key, value) = cookie.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn store() -> FlashStore {
        FlashStore::new("test-secret", "galleria_flash")
    }

    #[test]
    fn test_round_trip() {
        let store = store();
        let messages = vec![Flash::info("Uploaded"), Flash::warning("Careful")];

        let token = store.encode(&messages).unwrap();
        assert_eq!(store.decode(&token), messages);
    }

    #[test]
    fn test_tampered_or_foreign_tokens_are_ignored() {
        let store = store();
        let token = store.encode(&[Flash::error("boom")]).unwrap();

        let other = FlashStore::new("another-secret", "galleria_flash");
        assert!(other.decode(&token).is_empty());
        assert!(store.decode("not.a.token").is_empty());
    }

    #[test]
    fn test_take_reads_named_cookie() {
        let store = store();
        let token = store.encode(&[Flash::info("hello")]).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; galleria_flash={}; other=1", token)
                .parse()
                .unwrap(),
        );

        assert_eq!(store.take(&headers), Some(vec![Flash::info("hello")]));
        assert_eq!(store.take(&HeaderMap::new()), None);
    }

    #[test]
    fn test_redirect_sets_cookie() {
        let store = store();
        let response = store.redirect(&[Flash::warning("Invalid file type")], "/");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("galleria_flash="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=300"));
    }

    #[test]
    fn test_cookie_value_extraction() {
        let cookies = "session_id=abc123; galleria_flash=def456; other=value";
        assert_eq!(cookie_value(cookies, "galleria_flash"), Some("def456"));
        assert_eq!(cookie_value(cookies, "session_id"), Some("abc123"));
        assert_eq!(cookie_value(cookies, "nonexistent"), None);
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(store().clear_cookie().contains("Max-Age=0"));
    }
}
