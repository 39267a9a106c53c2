//! Configuration for chat history tooling.
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! `CHAT_HISTORY_*` environment variables.

use crate::engine::EngineConfig;
use crate::schema::SchemaCheck;
use crate::{ChatHistoryError, ChatHistoryResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default table used when a command does not name one.
pub const DEFAULT_TABLE_NAME: &str = "message_store";

pub const ENV_DB_PATH: &str = "CHAT_HISTORY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CHAT_HISTORY_LOG_LEVEL";
pub const ENV_TABLE: &str = "CHAT_HISTORY_TABLE";
pub const ENV_STRICT_SCHEMA: &str = "CHAT_HISTORY_STRICT_SCHEMA";

/// Chat history configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Table used when none is given explicitly.
    pub default_table: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Minimum idle pooled connections.
    pub min_idle: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub connection_timeout_secs: u64,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Also require TEXT affinity on `session_id` and `data`.
    pub strict_schema: bool,
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chat-history")
        .join("history.db")
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            database_path: default_database_path(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            default_table: DEFAULT_TABLE_NAME.to_string(),
            max_connections: engine.max_size,
            min_idle: engine.min_idle,
            connection_timeout_secs: engine.connection_timeout.as_secs(),
            busy_timeout_ms: engine.busy_timeout.as_millis() as u64,
            strict_schema: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        for ignored in config.load_from_env() {
            warn!("{}", ignored);
        }
        config
    }

    /// Load configuration from `path` (if given), then apply the environment.
    ///
    /// Environment values that could not be applied are returned alongside
    /// the config, so callers can report them once logging is set up. A path
    /// that was named explicitly but does not exist is an error.
    pub fn load(path: Option<&Path>) -> ChatHistoryResult<(Self, Vec<String>)> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            Some(path) => {
                return Err(ChatHistoryError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )))
            }
            None => Self::default(),
        };
        let ignored = config.load_from_env();
        Ok((config, ignored))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ChatHistoryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ChatHistoryResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CHAT_HISTORY_*` overrides from a variable lookup.
    ///
    /// Returns a message for each value that was ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(table) = lookup(ENV_TABLE).filter(|v| !v.trim().is_empty()) {
            self.default_table = table;
        }
        let mut ignored = Vec::new();
        if let Some(raw) = lookup(ENV_STRICT_SCHEMA) {
            match parse_bool(&raw) {
                Some(strict) => self.strict_schema = strict,
                None => ignored.push(format!(
                    "Ignoring unrecognized {} value {:?}",
                    ENV_STRICT_SCHEMA, raw
                )),
            }
        }
        ignored
    }

    pub fn schema_check(&self) -> SchemaCheck {
        if self.strict_schema {
            SchemaCheck::Strict
        } else {
            SchemaCheck::Minimal
        }
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_size: self.max_connections,
            min_idle: self.min_idle,
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            schema_check: self.schema_check(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
