//! Async access to a chat history for Tokio callers.
//!
//! SQLite calls block, so every operation is shipped to Tokio's blocking
//! pool and the calling task is parked until it finishes.

use crate::engine::ChatHistoryEngine;
use crate::history::ChatMessageHistory;
use crate::message::ChatMessage;
use crate::traits::ChatHistory;
use crate::{ChatHistoryError, ChatHistoryResult};
use std::sync::Arc;

/// Run a blocking closure on Tokio's blocking pool.
async fn run_blocking<F, T>(f: F) -> ChatHistoryResult<T>
where
    F: FnOnce() -> ChatHistoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ChatHistoryError::Task(e.to_string()))?
}

/// Async façade over [`ChatMessageHistory`].
#[derive(Debug, Clone)]
pub struct AsyncChatMessageHistory {
    inner: Arc<ChatMessageHistory>,
}

impl AsyncChatMessageHistory {
    /// Bind to a table for a session, validating the table first.
    pub async fn new(
        engine: ChatHistoryEngine,
        session_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> ChatHistoryResult<Self> {
        let session_id = session_id.into();
        let table_name = table_name.into();
        let history =
            run_blocking(move || ChatMessageHistory::new(engine, session_id, &table_name)).await?;
        Ok(Self::from_sync(history))
    }

    pub fn from_sync(history: ChatMessageHistory) -> Self {
        Self {
            inner: Arc::new(history),
        }
    }

    pub fn session_id(&self) -> &str {
        self.inner.session_id()
    }

    pub fn inner(&self) -> &ChatMessageHistory {
        &self.inner
    }

    pub async fn messages(&self) -> ChatHistoryResult<Vec<ChatMessage>> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.messages()).await
    }

    pub async fn add_message(&self, message: ChatMessage) -> ChatHistoryResult<()> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.add_message(&message)).await
    }

    pub async fn add_messages(&self, messages: Vec<ChatMessage>) -> ChatHistoryResult<()> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.add_messages(&messages)).await
    }

    pub async fn add_user_message(&self, text: impl Into<String>) -> ChatHistoryResult<()> {
        self.add_message(ChatMessage::human(text)).await
    }

    pub async fn add_ai_message(&self, text: impl Into<String>) -> ChatHistoryResult<()> {
        self.add_message(ChatMessage::ai(text)).await
    }

    pub async fn clear(&self) -> ChatHistoryResult<()> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.clear()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::message::Role;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_async_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let engine =
            ChatHistoryEngine::open(&dir.path().join("async.db"), EngineConfig::default())
                .unwrap();
        engine.init_chat_history_table("message_store").unwrap();

        let history = AsyncChatMessageHistory::new(engine, "test", "message_store")
            .await
            .unwrap();
        assert_eq!(history.session_id(), "test");

        history.add_user_message("hi").await.unwrap();
        history.add_ai_message("whats up?").await.unwrap();

        let messages = history.messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), Role::Human);
        assert_eq!(messages[1].content(), "whats up?");

        history.clear().await.unwrap();
        assert!(history.messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_async_missing_table() {
        let dir = tempdir().unwrap();
        let engine =
            ChatHistoryEngine::open(&dir.path().join("async_missing.db"), EngineConfig::default())
                .unwrap();

        let err = AsyncChatMessageHistory::new(engine, "test", "missing_table")
            .await
            .unwrap_err();
        assert!(err.is_table_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_every_message() {
        let dir = tempdir().unwrap();
        let engine =
            ChatHistoryEngine::open(&dir.path().join("async_many.db"), EngineConfig::default())
                .unwrap();
        engine.init_chat_history_table("message_store").unwrap();

        let history = AsyncChatMessageHistory::new(engine, "test", "message_store")
            .await
            .unwrap();

        let mut handles = vec![];
        for i in 0..10 {
            let history = history.clone();
            handles.push(tokio::spawn(async move {
                history.add_user_message(format!("message {}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(history.messages().await.unwrap().len(), 10);
    }
}
