//! Google Gemini `generateContent` client
//!
//! Constructed once at startup. A missing credential fails construction so
//! scene generation is known to be unavailable before any request arrives.

use async_trait::async_trait;
use pavg_common::config::{is_valid_key, GeminiConfig};
use pavg_common::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::text_generator::{GenerationError, TextGenerator};

const USER_AGENT: &str = concat!("pavg-server/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini REST client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client; `Error::Config` if no usable API key was resolved
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| is_valid_key(key))
            .ok_or_else(|| {
                Error::Config(format!(
                    "Gemini API key not configured. Set {} or [gemini].api_key in config.toml",
                    pavg_common::config::GEMINI_API_KEY_ENV
                ))
            })?
            .to_string();

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            endpoint: endpoint_for_model(&config.api_base, &config.model),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Querying Gemini");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_secs)
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(status.as_u16(), error_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_secs)
            } else {
                GenerationError::Parse(e.to_string())
            }
        })?;

        let text = extract_text(parsed)?;
        tracing::info!(model = %self.model, chars = text.len(), "Gemini generation succeeded");
        Ok(text)
    }
}

fn endpoint_for_model(api_base: &str, model: &str) -> String {
    let trimmed = model.trim();
    let model_path = if trimmed.starts_with("models/") {
        trimmed.to_string()
    } else {
        format!("models/{}", trimmed)
    };
    format!(
        "{}/{}:generateContent",
        api_base.trim_end_matches('/'),
        model_path
    )
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> std::result::Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            api_key: key.map(str::to_string),
            api_base: "https://example.invalid/v1beta/".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_missing_key_fails_construction() {
        assert!(matches!(GeminiClient::new(&config(None)), Err(Error::Config(_))));
        assert!(matches!(GeminiClient::new(&config(Some("  "))), Err(Error::Config(_))));
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(&config(Some("key"))).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.invalid/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.name(), "gemini-1.5-flash");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let client = GeminiClient::new(&config(Some("super-secret"))).unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[test]
    fn test_endpoint_accepts_prefixed_model() {
        assert_eq!(
            endpoint_for_model("https://h/v1", "models/gemini-pro"),
            "https://h/v1/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "<html>" }, { "text": "</html>" }] }
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "<html></html>");
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(extract_text(response), Err(GenerationError::EmptyResponse)));

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert!(matches!(extract_text(blocked), Err(GenerationError::EmptyResponse)));
    }
}
