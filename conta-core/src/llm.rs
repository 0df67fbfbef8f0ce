//! The generation trait implemented by chat model backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::error::Result;

/// Sampling and length parameters for one generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature. `None` uses the backend default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens. `None` uses the backend default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// A chat generation backend.
///
/// Implementations receive the full ordered message sequence for the turn
/// (system preamble, replayed history, per-turn instructions, and the user
/// message) and return the assistant's reply text.
///
/// # Example
///
/// ```rust,ignore
/// let reply = llm.generate(&state.replay(), &GenerationConfig::default()).await?;
/// ```
#[async_trait]
pub trait Llm: Send + Sync {
    /// The backend/model name, for logging.
    fn name(&self) -> &str;

    /// Generate a reply for the given message sequence.
    async fn generate(&self, messages: &[Message], config: &GenerationConfig) -> Result<String>;
}
