//! CLI command implementations.

mod messages;
mod tables;

pub use messages::{
    add_message, clear_messages, list_messages, list_sessions, new_session, MessageRole,
};
pub use tables::{drop_table, init_table, validate_table};

use anyhow::{Context, Result};
use chat_history_store::{ChatHistoryEngine, Config};

/// Open the engine described by the configuration.
pub fn open_engine(config: &Config) -> Result<ChatHistoryEngine> {
    ChatHistoryEngine::open(&config.database_path, config.engine_config())
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// The table named on the command line, or the configured default.
pub fn resolve_table<'a>(config: &'a Config, table: Option<&'a str>) -> &'a str {
    table.unwrap_or(&config.default_table)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_table_prefers_explicit_name() {
        let config = Config::default();
        assert_eq!(resolve_table(&config, Some("other")), "other");
        assert_eq!(resolve_table(&config, None), chat_history_store::DEFAULT_TABLE_NAME);
    }

    #[test]
    fn test_open_engine_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("configured.db"),
            ..Config::default()
        };
        let engine = open_engine(&config).unwrap();
        assert!(engine.path().ends_with("configured.db"));
    }
}
