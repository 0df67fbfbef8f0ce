//! Gemini chat client over the Generative Language REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use conta_core::{CoreError, GenerationConfig, Llm, Message, Result, Role};

/// Base URL of the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default chat model.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// An [`Llm`] backed by the Gemini `generateContent` endpoint.
///
/// System messages become the request's `systemInstruction`; user and
/// assistant messages map to `user`/`model` contents in order.
pub struct GeminiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiChat {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(CoreError::InvalidRequest("API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Generation {
                provider: "Gemini".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, api_key, model: DEFAULT_MODEL.into() })
    }

    /// Set the model name (e.g. `gemini-2.0-flash-lite`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn generation_err(message: String) -> CoreError {
        CoreError::Generation { provider: "Gemini".into(), message }
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Fold a message sequence into the request shape: leading system texts
/// merge into one system instruction; the rest become role-tagged turns.
fn build_request<'a>(
    messages: &'a [Message],
    config: &GenerationConfig,
    system_buffer: &'a str,
) -> GenerateRequest<'a> {
    let system_instruction = if system_buffer.is_empty() {
        None
    } else {
        Some(Content { role: None, parts: vec![Part { text: system_buffer }] })
    };

    let contents = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Content {
            role: Some(match m.role {
                Role::Assistant => "model",
                _ => "user",
            }),
            parts: vec![Part { text: &m.text }],
        })
        .collect();

    let generation_config = if config.temperature.is_none() && config.max_output_tokens.is_none() {
        None
    } else {
        Some(ApiGenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    };

    GenerateRequest { system_instruction, contents, generation_config }
}

/// Join every system message's text for the system instruction.
fn collect_system_text(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Llm for GeminiChat {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message], config: &GenerationConfig) -> Result<String> {
        debug!(model = %self.model, turns = messages.len(), "generating reply");

        let system_text = collect_system_text(messages);
        let body = build_request(messages, config, &system_text);

        let url = format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "generation request failed");
                Self::generation_err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = "Gemini", %status, "generation API error");
            return Err(Self::generation_err(format!("API returned {status}: {detail}")));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse generation response");
            Self::generation_err(format!("failed to parse response: {e}"))
        })?;

        let reply = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(Self::generation_err("API returned no candidates".into()));
        }

        Ok(reply)
    }
}
