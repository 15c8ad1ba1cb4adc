//! Session cookie helpers

use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::registry::ListenerId;

/// Cookie carrying the listener id
pub const SESSION_COOKIE: &str = "idx";

/// Listener id from the request cookies, if present and well-formed
pub fn session_id(jar: &CookieJar) -> Option<ListenerId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

/// `idx=<id>` cookie, readable from page scripts
pub fn session_cookie(id: ListenerId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(false)
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};

    use super::*;

    fn jar(cookie: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(cookie));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_session_id_parsed() {
        let id = session_id(&jar("theme=dark; idx=42")).unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn test_session_id_missing_or_invalid() {
        assert!(session_id(&CookieJar::new()).is_none());
        assert!(session_id(&jar("idx=nope")).is_none());
        assert!(session_id(&jar("idx=0")).is_none());
        assert!(session_id(&jar("other=42")).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = "1234".parse().unwrap();
        let cookie = session_cookie(id);

        assert_eq!(cookie.name(), "idx");
        assert_eq!(cookie.value(), "1234");
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
    }
}
