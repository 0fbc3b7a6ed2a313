use axum::Router;
use std::sync::Arc;

use sovka_api::{config::Config, create_router, services::AppState};

pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // No AI key and no PIN hash: the AI gateway runs in mock mode and the
    // parent gate accepts the dev PIN, so tests need no network or secrets.
    let config = Config {
        port: 0,
        gemini_api_key: None,
        gemini_model: "gemini-2.0-flash".to_string(),
        parent_pin_hash: None,
    };

    let app_state = Arc::new(AppState::new(config).expect("Failed to initialize test app state"));

    create_router(app_state)
}
