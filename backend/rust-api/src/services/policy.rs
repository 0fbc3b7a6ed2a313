use crate::models::tutor::{HintLadderPolicy, PolicyDecision, ResponseType, Role};
use crate::services::intent::Intents;

// Legacy clients send step up to 4; the effective ladder ceiling is 3.
const STEP_MIN: i64 = 1;
const STEP_MAX: i64 = 3;
const ATTEMPTS_MIN: i64 = 0;
const ATTEMPTS_MAX: i64 = 10;

/// Minimum failed attempts before a kid-mode reveal may proceed without a
/// valid parent gate. Enforced by the tutor handler, not here.
pub const REVEAL_ATTEMPT_THRESHOLD: u8 = 2;

/// Pure decision function. All conversation history comes from the caller;
/// the only state feeding into reveals (the parent gate) is consulted by the
/// handler so this stays testable without I/O.
pub fn decide(role: Role, policy: &HintLadderPolicy, intents: Intents) -> PolicyDecision {
    let step = policy.step.clamp(STEP_MIN, STEP_MAX) as u8;
    let attempts = policy.attempts.clamp(ATTEMPTS_MIN, ATTEMPTS_MAX) as u8;

    // Direct-assistance path for adults: reveal on request, never gated.
    if role != Role::Kid {
        let desired = if intents.solve_intent || intents.reveal_intent {
            ResponseType::Reveal
        } else {
            ResponseType::Hint
        };
        return PolicyDecision {
            desired,
            allow_reveal: true,
            need_gate: false,
            step,
            attempts,
        };
    }

    let explicit = policy.explicit_reveal_asked || intents.reveal_intent;

    if explicit {
        // The engine wants to reveal but defers to the gate check.
        return PolicyDecision {
            desired: ResponseType::Reveal,
            allow_reveal: false,
            need_gate: true,
            step,
            attempts,
        };
    }

    if intents.solve_intent {
        // Hint ladder: only at the top step do we ask the child to attempt
        // and report back.
        let desired = if step == STEP_MAX as u8 {
            ResponseType::Check
        } else {
            ResponseType::Hint
        };
        return PolicyDecision {
            desired,
            allow_reveal: true,
            need_gate: false,
            step,
            attempts,
        };
    }

    PolicyDecision {
        desired: ResponseType::Hint,
        allow_reveal: true,
        need_gate: false,
        step,
        attempts,
    }
}
