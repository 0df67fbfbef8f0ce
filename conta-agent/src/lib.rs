//! # conta-agent
//!
//! The conversational policy layer of the Conta accounting assistant:
//! deterministic intent routing, rule-table classification, response
//! shaping, and the per-turn engine that dispatches between direct chat
//! and retrieval-grounded answers.

pub mod engine;
pub mod intent;
pub mod policy;
pub mod rules;

pub use engine::{
    GENERATION_APOLOGY, GREETING_REPLY, ReplyOutput, SYSTEM_PREAMBLE, TurnEngine, TurnOutput,
    UiActionOutput,
};
pub use intent::{IntentAction, IntentResolution, detect_intent, normalize};
pub use policy::{directives_for, generation_for};
pub use rules::{RuleTag, classify, has_tag};
