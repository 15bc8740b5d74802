//! Text-generation seam used by the scene composer
//!
//! The composer only needs "prompt in, document out". Production wires in
//! [`GeminiClient`](super::gemini_client::GeminiClient); tests inject stubs.

use async_trait::async_trait;
use thiserror::Error;

/// Failures of an external text-generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned no text")]
    EmptyResponse,
}

/// Produces a text document from a natural-language prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
