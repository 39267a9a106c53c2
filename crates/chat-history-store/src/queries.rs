//! Row-level queries against a chat history table.
//!
//! Every function takes a `&Connection` first, so they work on plain,
//! pooled, and transactional connections alike. The table name must already
//! be a validated [`TableName`]; session ids and payloads are bound.

use crate::message::ChatMessage;
use crate::schema::{TableName, DATA_COLUMN, ID_COLUMN, SESSION_ID_COLUMN};
use crate::{ChatHistoryError, ChatHistoryResult};
use rusqlite::{params, Connection};
use tracing::debug;

/// Append one message for a session.
pub fn insert_message(
    conn: &Connection,
    table: &TableName,
    session_id: &str,
    message: &ChatMessage,
) -> ChatHistoryResult<i64> {
    let data = message.to_stored()?;
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
        table.qualified(),
        SESSION_ID_COLUMN,
        DATA_COLUMN,
    ))?;
    stmt.execute(params![session_id, data])?;
    Ok(conn.last_insert_rowid())
}

/// Read a session's messages in insertion order.
pub fn select_messages(
    conn: &Connection,
    table: &TableName,
    session_id: &str,
) -> ChatHistoryResult<Vec<ChatMessage>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {id}, {data} FROM {table} WHERE {session} = ?1 ORDER BY {id} ASC",
        id = ID_COLUMN,
        data = DATA_COLUMN,
        table = table.qualified(),
        session = SESSION_ID_COLUMN,
    ))?;

    let rows = stmt
        .query_map(params![session_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, data)| {
            ChatMessage::from_stored(&data).map_err(|e| {
                ChatHistoryError::InvalidData(format!("row {} of {}: {}", id, table, e))
            })
        })
        .collect()
}

/// Delete every message of a session, returning the number of rows removed.
pub fn delete_session_messages(
    conn: &Connection,
    table: &TableName,
    session_id: &str,
) -> ChatHistoryResult<usize> {
    let count = conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1",
            table.qualified(),
            SESSION_ID_COLUMN
        ),
        params![session_id],
    )?;
    debug!(table = %table, count, "Deleted session messages");
    Ok(count)
}

/// Distinct session ids in a table, ordered by their first message.
pub fn list_sessions(conn: &Connection, table: &TableName) -> ChatHistoryResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {session} FROM {table} GROUP BY {session} ORDER BY MIN({id})",
        session = SESSION_ID_COLUMN,
        table = table.qualified(),
        id = ID_COLUMN,
    ))?;

    let sessions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(sessions)
}
