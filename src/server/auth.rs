//! Bearer token check for the publish endpoint

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use super::routes::AppState;

/// Optional shared secret for `/webhook`
#[derive(Debug, Clone, Default)]
pub struct BearerAuth {
    token: Option<String>,
}

impl BearerAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Whether a token is configured
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Check the `Authorization` header
    ///
    /// Scheme is case-insensitive, token must match exactly. Always passes when
    /// no token is configured.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.token.as_deref() else {
            return true;
        };

        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
                constant_time_eq(token.as_bytes(), expected.as_bytes())
            }
            _ => false,
        }
    }
}

/// Constant-time comparison using the `subtle` crate
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Auth middleware: rejects unauthorized publishes before the body is read
pub async fn require_bearer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !state.auth.authorize(req.headers()) {
        tracing::debug!("Received a request without a valid bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}
