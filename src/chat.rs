use tracing::warn;

use crate::backend::PlanningBackend;
use crate::domain::{ChatMessage, ChatRole};

pub const GREETING: &str =
    "Hello! I'm your FinanceIQ assistant. How can I help you with financial planning today?";

pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a financial data assistant. Answer only from the \
statement analysis you were given: monthly and category aggregates, recurring transactions, \
month-over-month changes, large single transactions and the summary. If the data does not \
contain the answer, say so plainly. Keep a neutral, professional tone.";

/// Assistant transcript. Each request carries only the system prompt and
/// the newest user message; the backend keeps no history.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl ChatSession {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![ChatMessage::new(ChatRole::Assistant, GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Sends `text` and appends the reply. Blank input is ignored.
    /// Any failure becomes [`FALLBACK_REPLY`] rather than an error.
    pub async fn send<B: PlanningBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Option<&ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }

        let user = ChatMessage::new(ChatRole::User, text);
        let history = [ChatMessage::new(ChatRole::System, self.system_prompt.clone()), user.clone()];
        self.messages.push(user);

        let reply = match backend.chat(text, &history).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, "chat.send.failed");
                FALLBACK_REPLY.to_string()
            }
        };
        self.messages.push(ChatMessage::new(ChatRole::Assistant, reply));
        self.messages.last()
    }
}
