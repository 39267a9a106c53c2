//! Creating and dropping chat history tables.

use crate::schema::{create_index_sql, create_table_sql, SchemaCheck, TableName};
use crate::validator;
use crate::{ChatHistoryError, ChatHistoryResult};
use rusqlite::Connection;
use tracing::info;

/// Create `table` with the canonical layout unless it already exists.
///
/// A pre-existing table is never altered. It is validated instead, so a
/// malformed table surfaces as `SchemaMismatch` here rather than on first use.
pub fn init_table(
    conn: &mut Connection,
    table: &TableName,
    check: SchemaCheck,
) -> ChatHistoryResult<()> {
    let tx = conn.transaction()?;

    let existed = validator::table_exists(&tx, table)?;
    tx.execute(&create_table_sql(table), [])?;
    validator::validate_table(&tx, table, check)?;
    tx.execute(&create_index_sql(table), [])?;

    tx.commit()?;

    if existed {
        info!(table = %table, "Chat history table already present");
    } else {
        info!(table = %table, "Chat history table created");
    }
    Ok(())
}

/// Drop `table`, failing with `TableNotFound` if it does not exist.
pub fn drop_table(conn: &mut Connection, table: &TableName) -> ChatHistoryResult<()> {
    let tx = conn.transaction()?;

    if !validator::table_exists(&tx, table)? {
        return Err(ChatHistoryError::TableNotFound {
            table: table.to_string(),
        });
    }
    tx.execute(&format!("DROP TABLE {}", table.qualified()), [])?;

    tx.commit()?;
    info!(table = %table, "Chat history table dropped");
    Ok(())
}
