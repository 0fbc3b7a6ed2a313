use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Upstream LLM credential. Absent → mock mode, not a startup failure.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// bcrypt hash of the parent PIN. Absent → dev PIN backdoor ("1234").
    pub parent_pin_hash: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", app_env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let port = settings
            .get_string("server.port")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3001);

        let gemini_api_key = settings
            .get_string("ai.gemini_api_key")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|s| !s.is_empty());

        if gemini_api_key.is_none() {
            eprintln!("WARNING: GEMINI_API_KEY not set, AI gateway runs in mock mode");
        }

        let gemini_model = settings
            .get_string("ai.gemini_model")
            .or_else(|_| env::var("GEMINI_MODEL"))
            .unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let parent_pin_hash = settings
            .get_string("parent.pin_hash")
            .or_else(|_| env::var("PARENT_PIN_HASH"))
            .ok()
            .filter(|s| !s.is_empty());

        if parent_pin_hash.is_none() {
            if app_env == "prod" {
                panic!("FATAL: PARENT_PIN_HASH must be set in production!");
            }
            eprintln!("WARNING: PARENT_PIN_HASH not set, dev PIN \"1234\" accepted (dev mode only!)");
        }

        Ok(Config {
            port,
            gemini_api_key,
            gemini_model,
            parent_pin_hash,
        })
    }
}
