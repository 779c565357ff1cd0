use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::queue::task::Delivery;
use crate::server::AppState;
use crate::webhook::signature::{verify_signature, SIGNATURE_HEADER};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Err(e) = verify_signature(
        &state.webhook_secret,
        &body,
        header(&headers, SIGNATURE_HEADER),
    ) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return StatusCode::UNAUTHORIZED;
    }

    let event_type = match header(&headers, "x-github-event") {
        Some(et) => et.to_string(),
        None => {
            tracing::warn!("Missing X-GitHub-Event header");
            return StatusCode::BAD_REQUEST;
        }
    };
    let delivery_id = header(&headers, "x-github-delivery")
        .unwrap_or("-")
        .to_string();

    tracing::info!(event_type = %event_type, delivery_id = %delivery_id, "Received webhook event");

    let delivery = Delivery {
        event_type,
        delivery_id,
        payload: body,
    };
    if !state.queue.enqueue(delivery) {
        tracing::error!("Delivery worker is gone, rejecting delivery");
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    StatusCode::ACCEPTED
}
