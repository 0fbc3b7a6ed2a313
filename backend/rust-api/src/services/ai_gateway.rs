use serde_json::json;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const LLM_TIMEOUT_SECS: u64 = 20;

/// Clearly-labeled reply used when no API key is configured. Deliberate
/// fallback so leak detection and response shaping stay exercisable offline.
const MOCK_REPLY: &str = "(Ukážkový režim bez AI kľúča.) Skúsme na to prísť spolu. \
Ktorá časť zadania ti robí najväčší problém?";

#[derive(Debug, thiserror::Error)]
pub enum AiGatewayError {
    #[error("AI upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("AI upstream call failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct AiGateway {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl AiGateway {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .expect("Failed to build AI gateway HTTP client");

        Self {
            client,
            api_key,
            model,
        }
    }

    pub fn mock_mode(&self) -> bool {
        self.api_key.is_none()
    }

    /// Calls the upstream LLM with the rendered system prompt. In mock mode
    /// this returns a fixed labeled string instead of erroring, so the rest
    /// of the pipeline runs without network access or secrets.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, AiGatewayError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!("AI gateway in mock mode, returning canned reply");
            return Ok(MOCK_REPLY.to_string());
        };

        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);

        let body = json!({
            "system_instruction": { "parts": [{ "text": system_prompt }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_text }] }],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiGatewayError::UpstreamStatus(response.status().as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;

        // Empty extraction is a valid-but-empty reply, not an error.
        Ok(extract_text(&payload))
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(payload: &serde_json::Value) -> String {
    payload["candidates"]
        .get(0)
        .and_then(|c| c["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
