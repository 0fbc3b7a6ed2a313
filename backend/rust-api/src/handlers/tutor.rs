use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::middlewares::rate_limit::user_key;
use crate::metrics::{LEAK_REWRITES_TOTAL, TUTOR_DECISIONS_TOTAL};
use crate::models::tutor::{ResponseType, Role, TutorRequest, TutorResponse};
use crate::services::{intent, policy, prompt, AppState};

/// In-character retry prompt. The tutor endpoint never shows a raw error to
/// a child, so every failure path lands here.
const SAFE_FALLBACK: &str = "Hmm, teraz mi to nejde. Skús mi svoju otázku \
napísať o chvíľku ešte raz, dobre?";

/// POST /api/tutor - One tutoring turn under the exposure policy
pub async fn tutor(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TutorRequest>, JsonRejection>,
) -> impl IntoResponse {
    let user = user_key(&headers);
    let role = Role::from_header(headers.get("x-role").and_then(|v| v.to_str().ok()));

    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!("Malformed tutor request, degrading to hint: {}", rejection);
            return fallback_response();
        }
    };

    if let Err(e) = req.validate() {
        tracing::warn!("Tutor request validation failed, degrading to hint: {}", e);
        return fallback_response();
    }

    let ladder = req.policy.unwrap_or_default();
    let intents = intent::classify(&req.user_text);
    let decision = policy::decide(role, &ladder, intents);

    // The only place session state feeds into the otherwise stateless
    // decision: a kid-mode reveal needs a live parent gate or enough
    // failed attempts, otherwise it is downgraded to a hint.
    let mut response_type = decision.desired;
    let mut need_gate = false;

    if role == Role::Kid && decision.desired == ResponseType::Reveal && !decision.allow_reveal {
        let gate_open = state.parent_gate.is_valid(&user);
        if gate_open || decision.attempts >= policy::REVEAL_ATTEMPT_THRESHOLD {
            response_type = ResponseType::Reveal;
        } else {
            response_type = ResponseType::Hint;
            need_gate = true;
        }
    }

    let system_prompt =
        prompt::build_system_prompt(role, response_type, decision.step, decision.attempts);

    let mut text = match state.ai.generate(&system_prompt, &req.user_text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("AI gateway failed, degrading to hint: {}", e);
            return degraded_response(need_gate);
        }
    };

    // Leak check only applies when we did not intend to reveal.
    if response_type != ResponseType::Reveal && intent::leaks_solution(&text) {
        tracing::warn!("AI reply leaked a solution, replacing with canned hint");
        LEAK_REWRITES_TOTAL.inc();
        text = intent::LEAK_FALLBACK.to_string();
        response_type = ResponseType::Hint;
    }

    TUTOR_DECISIONS_TOTAL
        .with_label_values(&[response_type.prompt_token()])
        .inc();

    Json(TutorResponse {
        response_type,
        text,
        need_gate: need_gate.then_some(true),
    })
}

fn fallback_response() -> Json<TutorResponse> {
    Json(TutorResponse {
        response_type: ResponseType::Hint,
        text: SAFE_FALLBACK.to_string(),
        need_gate: None,
    })
}

fn degraded_response(need_gate: bool) -> Json<TutorResponse> {
    Json(TutorResponse {
        response_type: ResponseType::Hint,
        text: SAFE_FALLBACK.to_string(),
        need_gate: need_gate.then_some(true),
    })
}
