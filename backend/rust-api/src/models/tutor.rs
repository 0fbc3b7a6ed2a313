use serde::{Deserialize, Serialize};
use validator::Validate;

/// Who is talking to the tutor. Drives policy strictness and reveal defaults.
/// Unknown header values fall back to the strictest role (kid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Kid,
    Parent,
    Teacher,
    Dev,
}

impl Role {
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("parent") => Role::Parent,
            Some("teacher") => Role::Teacher,
            Some("dev") => Role::Dev,
            _ => Role::Kid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Hint,
    Check,
    Reveal,
}

impl ResponseType {
    /// Upper-cased token used in the system prompt.
    pub fn prompt_token(&self) -> &'static str {
        match self {
            ResponseType::Hint => "HINT",
            ResponseType::Check => "CHECK",
            ResponseType::Reveal => "REVEAL",
        }
    }
}

/// Per-message hint-ladder input. The client resends it each turn; the
/// server keeps no conversation state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HintLadderPolicy {
    pub step: i64,
    pub attempts: i64,
    pub explicit_reveal_asked: bool,
}

impl Default for HintLadderPolicy {
    fn default() -> Self {
        Self {
            step: 1,
            attempts: 0,
            explicit_reveal_asked: false,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TutorRequest {
    #[validate(length(min = 1, max = 2500, message = "userText must be 1-2500 characters"))]
    pub user_text: String,

    pub policy: Option<HintLadderPolicy>,
}

#[derive(Debug, Serialize)]
pub struct TutorResponse {
    pub response_type: ResponseType,
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_gate: Option<bool>,
}

/// Output of the policy decision engine. `allow_reveal == false` means the
/// engine wants to reveal but defers to the parent-gate check in the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub desired: ResponseType,
    pub allow_reveal: bool,
    pub need_gate: bool,
    pub step: u8,
    pub attempts: u8,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPinRequest {
    #[validate(length(min = 3, max = 12, message = "pin must be 3-12 characters"))]
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPinResponse {
    pub ok: bool,
}
