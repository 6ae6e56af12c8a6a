//! Botifyx - demo AI assistant chat service
//!
//! A conversation state machine with a canned keyword responder standing
//! in for a model backend, served over a small HTTP/SSE API.

mod api;
mod config;
mod conversation;
mod responder;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::ChatConfig;
use conversation::TitleList;
use state_machine::ChatContext;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botifyx=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env();
    tracing::info!(
        port = config.port,
        response_delay_ms = %config.response_delay.as_millis(),
        response_timeout_ms = %config.response_timeout.as_millis(),
        match_mode = %config.match_mode,
        reset_policy = %config.reset_policy,
        "Configuration loaded"
    );

    // Start the conversation runtime
    let context = ChatContext::new(uuid::Uuid::new_v4().to_string(), config.reset_policy);
    let responder = responder::default_responder(config.match_mode, config.response_delay);
    let chat = runtime::spawn(
        context,
        TitleList::seeded(),
        responder,
        config.response_timeout,
    );

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(chat))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Botifyx server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
