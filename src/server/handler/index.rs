//! Entry page

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;

use crate::server::cookie;
use crate::server::routes::AppState;

/// Embedded single-page viewer
pub const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// `GET /`: serve the viewer, registering a session when needed
///
/// A cookie naming a live listener is honoured as-is. Anything else (no
/// cookie, garbage, or a session that has since been removed) gets a fresh
/// listener and a new `idx` cookie.
pub async fn serve_index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Html<&'static str>) {
    if let Some(id) = cookie::session_id(&jar) {
        if state.registry.get_listener(id).is_some() {
            tracing::debug!(listener_id = %id, "Reusing live session");
            return (jar, Html(INDEX_HTML));
        }
    }

    let (id, _) = state.registry.add_listener();
    tracing::info!(listener_id = %id, "Setting session cookie");

    (jar.add(cookie::session_cookie(id)), Html(INDEX_HTML))
}
