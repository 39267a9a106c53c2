//! Table lifecycle commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use chat_history_store::{ChatHistoryEngine, SchemaCheck};
use serde_json::json;

/// Create a chat history table, or confirm an existing one is usable.
pub fn init_table(engine: &ChatHistoryEngine, table: &str, format: &OutputFormat) -> Result<()> {
    engine.init_chat_history_table(table)?;
    output::print_success(&format!("Table {} is ready", table), format);
    Ok(())
}

/// Drop a chat history table.
pub fn drop_table(
    engine: &ChatHistoryEngine,
    table: &str,
    if_exists: bool,
    format: &OutputFormat,
) -> Result<()> {
    match engine.drop_chat_history_table(table) {
        Ok(()) => output::print_success(&format!("Table {} dropped", table), format),
        Err(e) if if_exists && e.is_table_not_found() => {
            output::print_success(&format!("Table {} does not exist", table), format)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Check a table against the chat history layout and show its columns.
pub fn validate_table(
    engine: &ChatHistoryEngine,
    table: &str,
    strict: bool,
    format: &OutputFormat,
) -> Result<()> {
    let check = if strict {
        SchemaCheck::Strict
    } else {
        engine.schema_check()
    };
    let columns = engine.validate_chat_history_table_with(table, check)?;

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("Table {} is valid", table));
            for column in &columns {
                let mut declaration = column.declared_type.clone();
                if column.not_null {
                    declaration.push_str(" NOT NULL");
                }
                if column.pk > 0 {
                    declaration.push_str(" PRIMARY KEY");
                }
                output::print_row(&column.name, &declaration);
            }
        }
        OutputFormat::Json => {
            let columns: Vec<_> = columns
                .iter()
                .map(|c| {
                    json!({
                        "name": c.name,
                        "type": c.declared_type,
                        "not_null": c.not_null,
                        "primary_key": c.pk > 0,
                    })
                })
                .collect();
            output::print_json(&json!({
                "table": table,
                "valid": true,
                "strict": check == SchemaCheck::Strict,
                "columns": columns,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::temp_engine;

    #[test]
    fn test_init_validate_drop() {
        let (_dir, engine) = temp_engine();

        init_table(&engine, "message_store", &OutputFormat::Text).unwrap();
        validate_table(&engine, "message_store", true, &OutputFormat::Json).unwrap();
        drop_table(&engine, "message_store", false, &OutputFormat::Text).unwrap();
        assert!(!engine.chat_history_table_exists("message_store").unwrap());
    }

    #[test]
    fn test_drop_missing_table() {
        let (_dir, engine) = temp_engine();

        let err = drop_table(&engine, "never_created", false, &OutputFormat::Text).unwrap_err();
        let err = err
            .downcast_ref::<chat_history_store::ChatHistoryError>()
            .unwrap();
        assert!(err.is_table_not_found());

        drop_table(&engine, "never_created", true, &OutputFormat::Text).unwrap();
    }
}
