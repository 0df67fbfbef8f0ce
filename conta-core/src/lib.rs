//! # conta-core
//!
//! Shared core for the Conta accounting assistant: conversation state,
//! the [`Llm`] generation trait, and the core error type.
//!
//! This crate is I/O-free. Model backends live in `conta-model`; the
//! retrieval stack lives in `conta-rag`; the per-turn policy that ties
//! them together lives in `conta-agent`.

mod conversation;
mod error;
mod llm;

pub use conversation::{ConversationState, Message, Role};
pub use error::{CoreError, Result};
pub use llm::{GenerationConfig, Llm};
