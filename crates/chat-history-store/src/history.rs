//! Chat history bound to one table and one session.

use crate::engine::ChatHistoryEngine;
use crate::message::ChatMessage;
use crate::queries;
use crate::schema::{validate_session_id, TableName};
use crate::traits::ChatHistory;
use crate::validator;
use crate::ChatHistoryResult;
use tracing::debug;

/// Message history of one session, stored in a validated table.
///
/// A value of this type only exists once its table has passed schema
/// validation. Nothing is cached: every read reflects the database as it is.
#[derive(Debug, Clone)]
pub struct ChatMessageHistory {
    engine: ChatHistoryEngine,
    session_id: String,
    table: TableName,
}

impl ChatMessageHistory {
    /// Bind to `table_name` for `session_id`.
    ///
    /// Fails with `TableNotFound` if the table is absent and with
    /// `SchemaMismatch` if it does not have the canonical columns.
    pub fn new(
        engine: ChatHistoryEngine,
        session_id: impl Into<String>,
        table_name: &str,
    ) -> ChatHistoryResult<Self> {
        let table = TableName::parse(table_name)?;
        let session_id = session_id.into();
        validate_session_id(&session_id)?;

        {
            let conn = engine.connect()?;
            validator::validate_table(&conn, &table, engine.schema_check())?;
        }

        debug!(table = %table, session_id = %session_id, "Chat history bound");
        Ok(Self {
            engine,
            session_id,
            table,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn table_name(&self) -> &TableName {
        &self.table
    }

    pub fn engine(&self) -> &ChatHistoryEngine {
        &self.engine
    }
}

impl ChatHistory for ChatMessageHistory {
    fn messages(&self) -> ChatHistoryResult<Vec<ChatMessage>> {
        let conn = self.engine.connect()?;
        queries::select_messages(&conn, &self.table, &self.session_id)
    }

    fn add_message(&self, message: &ChatMessage) -> ChatHistoryResult<()> {
        let conn = self.engine.connect()?;
        let id = queries::insert_message(&conn, &self.table, &self.session_id, message)?;
        debug!(
            table = %self.table,
            session_id = %self.session_id,
            id,
            role = %message.role(),
            "Message added"
        );
        Ok(())
    }

    /// All messages land in one transaction, or none do.
    fn add_messages(&self, messages: &[ChatMessage]) -> ChatHistoryResult<()> {
        let mut conn = self.engine.connect()?;
        let tx = conn.transaction()?;
        for message in messages {
            queries::insert_message(&tx, &self.table, &self.session_id, message)?;
        }
        tx.commit()?;
        debug!(
            table = %self.table,
            session_id = %self.session_id,
            count = messages.len(),
            "Messages added"
        );
        Ok(())
    }

    fn clear(&self) -> ChatHistoryResult<()> {
        let conn = self.engine.connect()?;
        let count = queries::delete_session_messages(&conn, &self.table, &self.session_id)?;
        debug!(
            table = %self.table,
            session_id = %self.session_id,
            count,
            "Chat history cleared"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::message::Role;
    use crate::ChatHistoryError;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ChatHistoryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            ChatHistoryEngine::open(&dir.path().join("history.db"), EngineConfig::default())
                .unwrap();
        engine.init_chat_history_table("message_store").unwrap();
        (dir, engine)
    }

    #[test]
    fn test_new_rejects_bad_session_ids() {
        let (_dir, engine) = setup();

        let err = ChatMessageHistory::new(engine.clone(), "", "message_store").unwrap_err();
        assert!(matches!(err, ChatHistoryError::InvalidSessionId(_)));

        let err =
            ChatMessageHistory::new(engine, "s".repeat(129), "message_store").unwrap_err();
        assert!(matches!(err, ChatHistoryError::InvalidSessionId(_)));
    }

    #[test]
    fn test_new_rejects_bad_table_names() {
        let (_dir, engine) = setup();
        let err = ChatMessageHistory::new(engine, "test", "message_store--").unwrap_err();
        assert!(matches!(err, ChatHistoryError::InvalidTableName(_)));
    }

    #[test]
    fn test_accessors() {
        let (_dir, engine) = setup();
        let history = ChatMessageHistory::new(engine, "test", "message_store").unwrap();
        assert_eq!(history.session_id(), "test");
        assert_eq!(history.table_name().as_str(), "message_store");
        assert!(history.engine().path().ends_with("history.db"));
    }

    #[test]
    fn test_add_messages_keeps_slice_order() {
        let (_dir, engine) = setup();
        let history = ChatMessageHistory::new(engine, "test", "message_store").unwrap();

        history
            .add_messages(&[
                ChatMessage::system("be brief"),
                ChatMessage::human("hi"),
                ChatMessage::ai("hello"),
            ])
            .unwrap();

        let roles: Vec<Role> = history.messages().unwrap().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::System, Role::Human, Role::Ai]);
    }

    #[test]
    fn test_add_messages_is_all_or_nothing() {
        let (_dir, engine) = setup();
        {
            let conn = engine.connect().unwrap();
            conn.execute_batch(
                "CREATE TABLE short_store (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id VARCHAR(128) NOT NULL,
                    data TEXT NOT NULL CHECK (length(data) < 80)
                )",
            )
            .unwrap();
        }
        let history = ChatMessageHistory::new(engine, "test", "short_store").unwrap();

        let err = history
            .add_messages(&[ChatMessage::human("short"), ChatMessage::ai("x".repeat(200))])
            .unwrap_err();
        assert!(matches!(err, ChatHistoryError::Sqlite(_)));
        assert!(history.messages().unwrap().is_empty());
    }

    #[test]
    fn test_reads_are_not_cached() {
        let (_dir, engine) = setup();
        let writer = ChatMessageHistory::new(engine.clone(), "test", "message_store").unwrap();
        let reader = ChatMessageHistory::new(engine, "test", "message_store").unwrap();

        assert!(reader.messages().unwrap().is_empty());
        writer.add_user_message("first").unwrap();
        assert_eq!(reader.messages().unwrap().len(), 1);
        writer.clear().unwrap();
        assert!(reader.messages().unwrap().is_empty());
    }

    #[test]
    fn test_usable_as_trait_object() {
        let (_dir, engine) = setup();
        let history: Box<dyn ChatHistory> =
            Box::new(ChatMessageHistory::new(engine, "test", "message_store").unwrap());

        history.add_ai_message("from a trait object").unwrap();
        assert_eq!(history.messages().unwrap()[0].content(), "from a trait object");
    }
}
