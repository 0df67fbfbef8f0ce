//! # conta-model
//!
//! Chat model backends for the Conta accounting assistant.
//!
//! - [`GeminiChat`] — Google's Gemini models over the Generative
//!   Language REST API
//! - [`ScriptedLlm`] — a deterministic mock for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conta_model::GeminiChat;
//!
//! let llm = GeminiChat::new(api_key)?;
//! let reply = llm.generate(&messages, &GenerationConfig::default()).await?;
//! ```

pub mod gemini;
pub mod mock;

pub use gemini::GeminiChat;
pub use mock::ScriptedLlm;
