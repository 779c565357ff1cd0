use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::bot::Bot;
use crate::config::AppConfig;
use crate::error::Result;
use crate::platform::Platform;
use crate::queue::{self, DeliveryQueue};
use crate::shutdown::{drain_worker, wait_for_shutdown};
use crate::workspace::command::CommandRunner;

pub struct AppState {
    pub webhook_secret: String,
    pub queue: DeliveryQueue,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/github", post(crate::webhook::handler::handle_webhook))
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Accept deliveries over HTTP and handle them one at a time until shutdown.
pub async fn serve(
    config: AppConfig,
    platform: Arc<dyn Platform>,
    runner: Arc<dyn CommandRunner>,
) -> Result<()> {
    let webhook_secret = config.webhook_secret()?.to_string();
    let (queue, rx) = queue::channel();

    let revendor_config = config.revendor.clone();
    let worker = tokio::spawn(queue::run_worker(rx, move |delivery| {
        // A fresh bot per delivery so reported durations cover only this one.
        let bot = Bot::new(Arc::clone(&platform), Arc::clone(&runner), &revendor_config);
        async move {
            if let Err(e) = bot
                .handle(&delivery.event_type, &delivery.delivery_id, &delivery.payload)
                .await
            {
                tracing::error!(
                    task = %delivery.description(),
                    error = %e,
                    "Delivery failed"
                );
            }
        }
    }));

    let state = Arc::new(AppState {
        webhook_secret,
        queue,
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    // The router, and with it the last queue sender, is gone now.
    drain_worker(worker, config.revendor.timeout()).await;

    Ok(())
}
