//! SQLite-backed chat message history.
//!
//! This crate provides:
//! - A pooled SQLite engine passed explicitly to every store
//! - Creation and removal of chat history tables with a fixed layout
//! - Schema validation that runs before a store binds to a table
//! - Per-session append, ordered read, and clear
//! - An async façade for Tokio callers
//!
//! # Usage
//!
//! ```ignore
//! let engine = ChatHistoryEngine::open(path, EngineConfig::default())?;
//! engine.init_chat_history_table("message_store")?;
//!
//! let history = ChatMessageHistory::new(engine, "session-1", "message_store")?;
//! history.add_user_message("hi")?;
//! history.add_ai_message("whats up?")?;
//! let messages = history.messages()?;
//! history.clear()?;
//! ```
//!
//! A store can only be constructed against a table that exists and passes
//! validation; otherwise construction returns `TableNotFound` or
//! `SchemaMismatch`.

mod async_history;
mod config;
mod engine;
mod error;
mod history;
pub mod lifecycle;
mod message;
pub mod queries;
pub mod schema;
mod traits;
pub mod validator;

pub use async_history::AsyncChatMessageHistory;
pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_TABLE_NAME};
pub use engine::{ChatHistoryEngine, EngineConfig, EngineConnection, PoolState};
pub use error::{ChatHistoryError, ChatHistoryResult};
pub use history::ChatMessageHistory;
pub use message::{ChatMessage, MessageData, Role};
pub use schema::{Affinity, ColumnInfo, SchemaCheck, SchemaViolation, TableName, TableShape};
pub use traits::ChatHistory;
