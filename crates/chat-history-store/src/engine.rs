//! Pooled SQLite engine shared by every history store.
//!
//! The engine is the database handle callers pass in explicitly. It wraps an
//! r2d2 pool of SQLite connections in WAL mode, so concurrent readers don't
//! wait on writers. Each operation checks out one connection and returns it
//! to the pool when the guard drops.

use crate::lifecycle;
use crate::queries;
use crate::schema::{ColumnInfo, SchemaCheck, TableName};
use crate::validator;
use crate::{ChatHistoryError, ChatHistoryResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A connection checked out of the engine's pool.
pub type EngineConnection = PooledConnection<SqliteConnectionManager>;

/// Configuration for the engine's pool and validation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum connections in the pool.
    pub max_size: u32,
    /// Minimum idle connections to maintain.
    pub min_idle: Option<u32>,
    /// Connection acquisition timeout.
    pub connection_timeout: Duration,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Validation applied when a store binds to a table.
    pub schema_check: SchemaCheck,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: Some(2),
            connection_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_millis(5000),
            schema_check: SchemaCheck::Minimal,
        }
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// Total connections (active + idle).
    pub connections: u32,
    /// Currently idle connections.
    pub idle_connections: u32,
}

/// Thread-safe handle to a chat history database.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct ChatHistoryEngine {
    pool: Pool<SqliteConnectionManager>,
    path: Arc<str>,
    schema_check: SchemaCheck,
}

impl fmt::Debug for ChatHistoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatHistoryEngine")
            .field("path", &self.path)
            .field("schema_check", &self.schema_check)
            .finish()
    }
}

impl ChatHistoryEngine {
    /// Open an engine on the database file at `path`.
    ///
    /// Creates the file and its parent directory if needed. Tables are not
    /// created here; see [`ChatHistoryEngine::init_chat_history_table`].
    pub fn open(path: &Path, config: EngineConfig) -> ChatHistoryResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();
        let busy_timeout = config.busy_timeout;

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA temp_store = MEMORY;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| ChatHistoryError::Connection(e.to_string()))?;

        info!(
            path = %path_str,
            max_size = config.max_size,
            schema_check = ?config.schema_check,
            "Chat history engine opened"
        );

        Ok(Self {
            pool,
            path: Arc::from(path_str),
            schema_check: config.schema_check,
        })
    }

    /// Check out a connection from the pool.
    ///
    /// Blocks until a connection is available or the timeout is reached.
    /// The connection goes back to the pool when dropped.
    pub fn connect(&self) -> ChatHistoryResult<EngineConnection> {
        self.pool
            .get()
            .map_err(|e| ChatHistoryError::Connection(e.to_string()))
    }

    /// Get pool statistics for monitoring.
    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn schema_check(&self) -> SchemaCheck {
        self.schema_check
    }

    /// Check the pool is healthy by acquiring and releasing a connection.
    pub fn health_check(&self) -> ChatHistoryResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("SELECT 1")?;
        debug!("Chat history engine health check passed");
        Ok(())
    }

    /// Create a chat history table if it does not exist.
    ///
    /// An existing table is kept as is, but must pass validation.
    pub fn init_chat_history_table(&self, table_name: &str) -> ChatHistoryResult<()> {
        let table = TableName::parse(table_name)?;
        let mut conn = self.connect()?;
        lifecycle::init_table(&mut conn, &table, self.schema_check)
    }

    /// Drop a chat history table.
    ///
    /// Fails with [`ChatHistoryError::TableNotFound`] if there is nothing to drop.
    pub fn drop_chat_history_table(&self, table_name: &str) -> ChatHistoryResult<()> {
        let table = TableName::parse(table_name)?;
        let mut conn = self.connect()?;
        lifecycle::drop_table(&mut conn, &table)
    }

    pub fn chat_history_table_exists(&self, table_name: &str) -> ChatHistoryResult<bool> {
        let table = TableName::parse(table_name)?;
        let conn = self.connect()?;
        validator::table_exists(&conn, &table)
    }

    /// Validate a table with the engine's configured schema check.
    pub fn validate_chat_history_table(&self, table_name: &str) -> ChatHistoryResult<Vec<ColumnInfo>> {
        self.validate_chat_history_table_with(table_name, self.schema_check)
    }

    pub fn validate_chat_history_table_with(
        &self,
        table_name: &str,
        check: SchemaCheck,
    ) -> ChatHistoryResult<Vec<ColumnInfo>> {
        let table = TableName::parse(table_name)?;
        let conn = self.connect()?;
        validator::validate_table(&conn, &table, check)
    }

    /// List the distinct session ids stored in a table.
    pub fn list_sessions(&self, table_name: &str) -> ChatHistoryResult<Vec<String>> {
        let table = TableName::parse(table_name)?;
        let conn = self.connect()?;
        validator::validate_table(&conn, &table, self.schema_check)?;
        queries::list_sessions(&conn, &table)
    }
}
