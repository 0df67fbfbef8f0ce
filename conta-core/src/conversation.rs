//! Conversation state threaded through each turn.
//!
//! [`ConversationState`] is an explicit value: the policy engine takes a
//! state in and hands a state back, so the turn pipeline is a pure
//! `(state, input) -> (state', output)` transition. The system preamble is
//! fixed at construction and survives [`reset`](ConversationState::reset);
//! everything else is ordered, append-only history.

use serde::{Deserialize, Serialize};

/// The author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Ordered conversation history with a fixed system preamble.
///
/// The preamble encodes the persona and guardrails and is never removed.
/// History grows by append on every turn. [`replay`](Self::replay) produces
/// the message sequence to send to the generator: preamble first, then
/// history with any system-role messages stripped, so the persona is
/// injected exactly once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    preamble: Vec<Message>,
    history: Vec<Message>,
}

impl ConversationState {
    /// Create a new conversation with the given system preamble.
    pub fn new(preamble: Vec<Message>) -> Self {
        Self { preamble, history: Vec::new() }
    }

    /// Create a new conversation with a single system message as preamble.
    pub fn with_system(text: impl Into<String>) -> Self {
        Self::new(vec![Message::system(text)])
    }

    /// Append a user message to history.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.history.push(Message::user(text));
    }

    /// Append an assistant message to history.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.history.push(Message::assistant(text));
    }

    /// The fixed system preamble.
    pub fn preamble(&self) -> &[Message] {
        &self.preamble
    }

    /// The mutable turn history (preamble excluded).
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Number of history messages (preamble excluded).
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether any turns have been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop all history, restoring only the system preamble.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// The message sequence to replay to the generator.
    ///
    /// Preamble first, then history with system-role messages filtered out.
    pub fn replay(&self) -> Vec<Message> {
        self.preamble
            .iter()
            .cloned()
            .chain(self.history.iter().filter(|m| m.role != Role::System).cloned())
            .collect()
    }
}
