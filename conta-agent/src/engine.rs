//! The conversational policy engine: one turn in, one turn out.
//!
//! Per incoming message, in order: intent short-circuit, greeting
//! short-circuit, domain/shape classification, generation parameters,
//! RAG-or-direct dispatch, history append. The engine never mutates
//! shared state: it takes a [`ConversationState`] and returns the
//! successor state with the turn's output.

use std::sync::Arc;

use tracing::{error, info};

use conta_core::{ConversationState, Llm, Message};
use conta_rag::retrieval::{RetrievalOrchestrator, RetrievalOutcome, RetrievalScope, needs_retrieval};
use conta_rag::session::SessionContext;

use crate::intent::{IntentAction, detect_intent, normalize};
use crate::policy::{directives_for, generation_for};
use crate::rules::{RuleTag, classify};

/// The fixed persona preamble for new conversations.
pub const SYSTEM_PREAMBLE: &str =
    "Eres un asistente útil especializado en contabilidad. Responde en español, de forma clara y concisa.";

/// Canned reply for standalone greetings; the generator is not called.
pub const GREETING_REPLY: &str = "Hola, ¿en qué te puedo ayudar?";

/// User-facing message when the generation call fails.
pub const GENERATION_APOLOGY: &str =
    "Error al consultar Gemini. Revisa tu API key o intenta de nuevo.";

/// A resolved UI action: the tag plus the panel the UI layer should open.
#[derive(Debug, Clone, PartialEq)]
pub struct UiActionOutput {
    pub action: IntentAction,
    pub panel_id: &'static str,
    pub panel_label: &'static str,
    pub guide: String,
}

/// A generated reply with its retrieval footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOutput {
    pub text: String,
    /// Whether the reply was grounded in retrieved fragments.
    pub used_rag: bool,
    /// Number of fragments the reply was grounded on.
    pub fragment_count: usize,
    /// Generation attempts used (2 when the citation repair fired).
    pub attempts: u32,
}

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutput {
    /// The message resolved to a UI action; no generator call was made.
    UiAction(UiActionOutput),
    /// A canned reply (greeting); no generator call was made.
    Canned(String),
    /// A generated reply.
    Reply(ReplyOutput),
    /// Generation failed; the text is the apologetic user-facing string.
    Error(String),
}

/// Drives one conversation turn through the policy pipeline.
pub struct TurnEngine {
    llm: Arc<dyn Llm>,
    retrieval: Arc<RetrievalOrchestrator>,
}

impl TurnEngine {
    pub fn new(llm: Arc<dyn Llm>, retrieval: Arc<RetrievalOrchestrator>) -> Self {
        Self { llm, retrieval }
    }

    /// A fresh conversation with the persona preamble.
    pub fn new_conversation() -> ConversationState {
        ConversationState::with_system(SYSTEM_PREAMBLE)
    }

    /// Process one user message.
    ///
    /// Returns the successor conversation state and the turn's output.
    /// History grows only on successful generated replies, so a failed
    /// turn can be retried verbatim. Callers must serialize turns per
    /// session; history replay depends on submission order.
    pub async fn handle_turn(
        &self,
        state: ConversationState,
        input: &str,
        session: Option<&SessionContext>,
    ) -> (ConversationState, TurnOutput) {
        // 1. Deterministic intent routing, before any model call.
        if let Some(resolution) = detect_intent(input) {
            info!(action = ?resolution.action, "intent matched, short-circuiting");
            return (
                state,
                TurnOutput::UiAction(UiActionOutput {
                    action: resolution.action,
                    panel_id: resolution.action.panel_id(),
                    panel_label: resolution.action.panel_label(),
                    guide: resolution.guide,
                }),
            );
        }

        let normalized = normalize(input);
        let tags = classify(&normalized);

        // 2. Greeting short-circuit.
        if tags.contains(&RuleTag::Greeting) {
            return (state, TurnOutput::Canned(GREETING_REPLY.to_string()));
        }

        // 3.–6. Domain and shape directives, generation parameters.
        let instructions: Vec<Message> =
            directives_for(&tags).into_iter().map(Message::system).collect();
        let generation = generation_for(&tags);

        // 7. RAG or direct. Session documents take priority over the
        // persistent store; the grounded path degrades to direct chat on
        // any failure.
        let session_active = session.is_some_and(|s| s.has_documents());
        let mut grounded = None;

        if session_active || needs_retrieval(input) {
            let scope = match session {
                Some(ctx) if session_active => RetrievalScope::Session(ctx),
                _ => RetrievalScope::Store { document_id: None },
            };
            match self
                .retrieval
                .answer(self.llm.as_ref(), &generation, &state, input, &instructions, scope)
                .await
            {
                RetrievalOutcome::Grounded { reply, matches, attempts } => {
                    grounded = Some((reply, matches.len(), attempts));
                }
                RetrievalOutcome::Fallback { reason } => {
                    info!(%reason, "retrieval fell back to direct chat");
                }
            }
        }

        let (reply, used_rag, fragment_count, attempts) = match grounded {
            Some((reply, fragment_count, attempts)) => (reply, true, fragment_count, attempts),
            None => {
                let mut messages = state.replay();
                messages.extend(instructions.iter().cloned());
                messages.push(Message::user(input));

                match self.llm.generate(&messages, &generation).await {
                    Ok(reply) => (reply, false, 0, 1),
                    Err(e) => {
                        error!(error = %e, "generation failed");
                        return (state, TurnOutput::Error(GENERATION_APOLOGY.to_string()));
                    }
                }
            }
        };

        let mut state = state;
        state.push_user(input);
        state.push_assistant(&reply);

        (
            state,
            TurnOutput::Reply(ReplyOutput { text: reply, used_rag, fragment_count, attempts }),
        )
    }
}
