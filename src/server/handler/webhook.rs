//! Webhook receiver

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;

use crate::registry::WebhookMessage;
use crate::server::routes::AppState;

/// `POST /webhook`: enqueue the body for every live listener
///
/// Bearer auth runs as route middleware before this handler. Returns 200 as
/// soon as the message is queued, whether or not anyone is listening.
pub async fn receive_webhook(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(error = %rejection, "Webhook body too large");
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        Err(rejection) => {
            tracing::error!(error = %rejection, "Failed to read webhook body");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    tracing::info!(bytes = body.len(), "Received a webhook");

    match state.relay.publish(WebhookMessage::new(body)).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Failed to queue webhook");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
