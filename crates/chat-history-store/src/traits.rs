//! Chat history trait definitions.

use crate::message::ChatMessage;
use crate::ChatHistoryResult;

/// Trait for stores that keep one conversation's message history.
pub trait ChatHistory: Send + Sync {
    /// All messages of the conversation, oldest first
    fn messages(&self) -> ChatHistoryResult<Vec<ChatMessage>>;

    /// Append a message
    fn add_message(&self, message: &ChatMessage) -> ChatHistoryResult<()>;

    /// Append several messages in order.
    /// Stores that can do so atomically should override this.
    fn add_messages(&self, messages: &[ChatMessage]) -> ChatHistoryResult<()> {
        for message in messages {
            self.add_message(message)?;
        }
        Ok(())
    }

    /// Remove every message of the conversation
    fn clear(&self) -> ChatHistoryResult<()>;

    /// Append a human-authored message
    fn add_user_message(&self, text: &str) -> ChatHistoryResult<()> {
        self.add_message(&ChatMessage::human(text))
    }

    /// Append an AI-authored message
    fn add_ai_message(&self, text: &str) -> ChatHistoryResult<()> {
        self.add_message(&ChatMessage::ai(text))
    }
}
