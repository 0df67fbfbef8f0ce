//! A scripted mock LLM for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use conta_core::{CoreError, GenerationConfig, Llm, Message, Result};

/// An [`Llm`] that replays a fixed script of replies in order and records
/// every request it receives.
///
/// When the script runs out, calls fail with a generation error — useful
/// for asserting that a code path performs an exact number of calls.
pub struct ScriptedLlm {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// One recorded generation request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub config: GenerationConfig,
}

impl ScriptedLlm {
    /// Create a mock that replies with the given texts, in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stack: Vec<String> = replies.into_iter().map(Into::into).collect();
        stack.reverse();
        Self { replies: Mutex::new(stack), calls: Mutex::new(Vec::new()) }
    }

    /// How many generation calls were made.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// The recorded calls, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, messages: &[Message], config: &GenerationConfig) -> Result<String> {
        self.calls
            .lock()
            .await
            .push(RecordedCall { messages: messages.to_vec(), config: config.clone() });
        self.replies.lock().await.pop().ok_or_else(|| CoreError::Generation {
            provider: "scripted".into(),
            message: "script exhausted".into(),
        })
    }
}
