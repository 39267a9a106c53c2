//! Message and session commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use chat_history_store::{ChatHistory, ChatHistoryEngine, ChatMessage, ChatMessageHistory, Role};
use clap::ValueEnum;
use serde_json::json;
use uuid::Uuid;

/// Message author as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageRole {
    Human,
    Ai,
    System,
}

impl From<MessageRole> for Role {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Human => Role::Human,
            MessageRole::Ai => Role::Ai,
            MessageRole::System => Role::System,
        }
    }
}

/// Append one message to a session.
pub fn add_message(
    engine: &ChatHistoryEngine,
    table: &str,
    session_id: &str,
    role: MessageRole,
    text: &str,
    format: &OutputFormat,
) -> Result<()> {
    let history = ChatMessageHistory::new(engine.clone(), session_id, table)?;
    let message = ChatMessage::new(role.into(), text);
    history.add_message(&message)?;
    output::print_success(
        &format!("Added {} message to session {}", message.role(), session_id),
        format,
    );
    Ok(())
}

/// Print a session's messages, oldest first.
pub fn list_messages(
    engine: &ChatHistoryEngine,
    table: &str,
    session_id: &str,
    format: &OutputFormat,
) -> Result<()> {
    let history = ChatMessageHistory::new(engine.clone(), session_id, table)?;
    let messages = history.messages()?;

    match format {
        OutputFormat::Text => {
            if messages.is_empty() {
                println!("No messages found");
            } else {
                println!("{:<6} {:<8} {}", "#", "Role", "Content");
                println!("{}", "-".repeat(80));
                for (i, message) in messages.iter().enumerate() {
                    println!("{:<6} {:<8} {}", i + 1, message.role(), message.content());
                }
            }
        }
        OutputFormat::Json => output::print_json(&json!({
            "table": table,
            "session_id": session_id,
            "messages": messages,
        })),
    }
    Ok(())
}

/// Delete every message of a session.
pub fn clear_messages(
    engine: &ChatHistoryEngine,
    table: &str,
    session_id: &str,
    format: &OutputFormat,
) -> Result<()> {
    let history = ChatMessageHistory::new(engine.clone(), session_id, table)?;
    history.clear()?;
    output::print_success(&format!("Cleared session {}", session_id), format);
    Ok(())
}

/// Print the session ids present in a table.
pub fn list_sessions(engine: &ChatHistoryEngine, table: &str, format: &OutputFormat) -> Result<()> {
    let sessions = engine.list_sessions(table)?;

    match format {
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions found");
            } else {
                for session in &sessions {
                    println!("{}", session);
                }
            }
        }
        OutputFormat::Json => output::print_json(&json!({
            "table": table,
            "sessions": sessions,
        })),
    }
    Ok(())
}

/// Print a fresh session id.
pub fn new_session(format: &OutputFormat) -> Result<()> {
    let session_id = Uuid::new_v4().to_string();
    match format {
        OutputFormat::Text => println!("{}", session_id),
        OutputFormat::Json => output::print_json(&json!({ "session_id": session_id })),
    }
    Ok(())
}
