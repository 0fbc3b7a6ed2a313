use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON extractor that rejects malformed or incomplete bodies with a 400
/// JSON payload instead of the default plain-text rejection. Used on the
/// adult-facing EduPage endpoints; the tutor endpoint handles its own
/// rejections because a child must never see a parse error.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection);
                let error_response = json!({
                    "error": format!("Invalid request body: {}", rejection),
                });
                Err((StatusCode::BAD_REQUEST, Json(error_response)).into_response())
            }
        }
    }
}
