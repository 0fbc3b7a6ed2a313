use std::sync::Arc;

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub sessions: Arc<session_store::SessionStore>,
    pub parent_gate: parent_gate::ParentGateService,
    pub rate_limiter: Box<dyn rate_limit::RateLimitStore>,
    pub ai: ai_gateway::AiGateway,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Allow overriding the tutor limit via env RATE_LIMIT_PER_USER
        let limit = std::env::var("RATE_LIMIT_PER_USER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(rate_limit::DEFAULT_RATE_LIMIT);

        let parent_gate = parent_gate::ParentGateService::new(
            Box::new(parent_gate::InMemoryGateStore::default()),
            config.parent_pin_hash.clone(),
        );

        let ai = ai_gateway::AiGateway::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        );

        Ok(Self {
            config,
            sessions: Arc::new(session_store::SessionStore::new()),
            parent_gate,
            rate_limiter: Box::new(rate_limit::SlidingWindowLimiter::new(
                limit,
                rate_limit::RATE_WINDOW,
            )),
            ai,
        })
    }
}

pub mod ai_gateway;
pub mod edupage;
pub mod intent;
pub mod parent_gate;
pub mod policy;
pub mod prompt;
pub mod rate_limit;
pub mod session_store;
