use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::metrics::EDUPAGE_LOGINS_TOTAL;
use crate::services::{edupage, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct EdupageLoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,

    /// School identifier used to derive the EduPage subdomain.
    #[validate(length(min = 1, message = "ebuid is required"))]
    pub ebuid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdupageLoginResponse {
    pub session_id: String,
}

/// POST /api/edupage/login - Open a proxy session against the school site
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<EdupageLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    if edupage::is_demo_credentials(&req.username, &req.password) {
        let session = state.sessions.create_demo(&req.ebuid).map_err(|e| {
            tracing::error!("Failed to create demo session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

        tracing::info!("Demo session created for ebuid: {}", req.ebuid);
        EDUPAGE_LOGINS_TOTAL.with_label_values(&["demo"]).inc();
        return Ok(Json(EdupageLoginResponse {
            session_id: session.id.clone(),
        }));
    }

    let session = state.sessions.create(&req.ebuid).map_err(|e| {
        tracing::error!("Failed to create proxy session: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    match edupage::login(&session, &req.username, &req.password).await {
        Ok(()) => {
            EDUPAGE_LOGINS_TOTAL.with_label_values(&["success"]).inc();
            Ok(Json(EdupageLoginResponse {
                session_id: session.id.clone(),
            }))
        }
        Err(edupage::EdupageError::LoginFailed) => {
            // Failed handshake is terminal; the half-built session goes away.
            state.sessions.remove(&session.id);
            EDUPAGE_LOGINS_TOTAL.with_label_values(&["failed"]).inc();
            Err((
                StatusCode::UNAUTHORIZED,
                "Neplatné prihlasovacie údaje.".to_string(),
            ))
        }
        Err(e) => {
            state.sessions.remove(&session.id);
            EDUPAGE_LOGINS_TOTAL.with_label_values(&["error"]).inc();
            tracing::error!("EduPage login failed unexpectedly: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/edupage/snapshot - Fetch and normalize the school dashboard
pub async fn snapshot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Chýba identifikátor relácie.".to_string(),
        ))?;

    let session = state.sessions.get(session_id).ok_or((
        StatusCode::UNAUTHORIZED,
        "Relácia vypršala, prihlás sa znova.".to_string(),
    ))?;

    match edupage::fetch_snapshot(&session).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            tracing::error!("Snapshot fetch failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// POST /api/edupage/logout - Explicitly discard a proxy session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(session_id) = headers.get("x-session-id").and_then(|v| v.to_str().ok()) {
        state.sessions.remove(session_id);
    }
    Json(json!({ "ok": true }))
}
