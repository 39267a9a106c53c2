#![allow(dead_code)]

use chat_history_store::{ChatHistoryEngine, EngineConfig, SchemaCheck};
use tempfile::TempDir;

/// Every character of Python's `string.printable`.
pub const PRINTABLE: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

/// Open an engine on a fresh database file and return (TempDir, engine).
///
/// Keep the TempDir alive for as long as the engine is used.
pub fn temp_engine() -> (TempDir, ChatHistoryEngine) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let engine = ChatHistoryEngine::open(&dir.path().join("history.db"), EngineConfig::default())
        .expect("failed to open engine");
    (dir, engine)
}

/// Open another engine on the database file of `dir` with the given schema check.
pub fn open_engine(dir: &TempDir, schema_check: SchemaCheck) -> ChatHistoryEngine {
    let config = EngineConfig {
        schema_check,
        ..EngineConfig::default()
    };
    ChatHistoryEngine::open(&dir.path().join("history.db"), config).expect("failed to open engine")
}

/// Drop a table, treating "not there" as success.
pub fn drop_if_exists(engine: &ChatHistoryEngine, table_name: &str) {
    if let Err(e) = engine.drop_chat_history_table(table_name) {
        assert!(e.is_table_not_found(), "unexpected error: {}", e);
    }
}

/// Run raw SQL on a pooled connection.
pub fn execute_sql(engine: &ChatHistoryEngine, sql: &str) {
    let conn = engine.connect().expect("failed to connect");
    conn.execute_batch(sql).expect("failed to execute sql");
}
