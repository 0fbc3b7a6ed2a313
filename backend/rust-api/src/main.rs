#![allow(dead_code)]

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sovka_api::services::session_store;
use sovka_api::{config::Config, create_router, services::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sovka_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sovka backend API");

    let config = Config::load().expect("Failed to load configuration");
    let port = config.port;

    let app_state = Arc::new(AppState::new(config).expect("Failed to initialize application state"));

    // Fixed-TTL reaper for EduPage proxy sessions
    session_store::spawn_reaper(
        app_state.sessions.clone(),
        session_store::REAPER_INTERVAL,
    );

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("listener has no local addr")
    );

    axum::serve(listener, app).await.expect("Server error");
}
