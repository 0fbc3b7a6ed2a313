#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

/// Hardened-response-headers middleware applied to all responses
async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; connect-src 'self'"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS restricted to the known local dev origins of the PWA
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-user"),
            HeaderName::from_static("x-role"),
            HeaderName::from_static("x-session-id"),
        ])
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://localhost:3000"),
        ]));

    // The tutor endpoint is rate-limited before any policy or AI work
    let tutor_route = Router::new()
        .route("/api/tutor", post(handlers::tutor::tutor))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::tutor_rate_limit_middleware,
        ));

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/parent/verify-pin", post(handlers::parent::verify_pin))
        .merge(tutor_route)
        .route("/api/edupage/login", post(handlers::edupage::login))
        .route("/api/edupage/snapshot", get(handlers::edupage::snapshot))
        .route("/api/edupage/logout", post(handlers::edupage::logout))
        .with_state(app_state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
