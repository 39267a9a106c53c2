//! Schema validation for chat history tables.
//!
//! Everything is read from the catalog pragmas of the main schema:
//! `pragma_table_list` for existence and `WITHOUT ROWID`, `pragma_table_info`
//! for columns, `pragma_index_list` for how the primary key is stored. The
//! table name is always a bound parameter.

use crate::schema::{
    ColumnInfo, SchemaCheck, SchemaViolation, TableName, TableShape, CANONICAL_COLUMNS,
    MAIN_SCHEMA,
};
use crate::{ChatHistoryError, ChatHistoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

/// Catalog facts for a table in the main schema, or `None` if it does not exist.
///
/// Lookup is case-insensitive, like SQLite identifiers.
pub fn table_shape(conn: &Connection, table: &TableName) -> ChatHistoryResult<Option<TableShape>> {
    let without_rowid = conn
        .query_row(
            "SELECT wr FROM pragma_table_list
             WHERE schema = ?1 AND type = 'table' AND name = ?2 COLLATE NOCASE",
            params![MAIN_SCHEMA, table.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    let Some(without_rowid) = without_rowid else {
        return Ok(None);
    };

    let pk_index = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM pragma_index_list(?1, ?2) WHERE origin = 'pk')",
        params![table.as_str(), MAIN_SCHEMA],
        |row| row.get::<_, bool>(0),
    )?;

    Ok(Some(TableShape {
        without_rowid: without_rowid != 0,
        pk_index,
    }))
}

/// Check whether a table is present in the main schema.
pub fn table_exists(conn: &Connection, table: &TableName) -> ChatHistoryResult<bool> {
    Ok(table_shape(conn, table)?.is_some())
}

/// List a table's columns in declaration order.
pub fn table_columns(conn: &Connection, table: &TableName) -> ChatHistoryResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare_cached(
        "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1, ?2)",
    )?;

    let columns = stmt
        .query_map(params![table.as_str(), MAIN_SCHEMA], |row| {
            Ok(ColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                declared_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                pk: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

/// Validate a table against the canonical chat history layout.
///
/// Returns the table's columns on success. A missing table is reported as
/// [`ChatHistoryError::TableNotFound`]; every departure from the layout is
/// collected into a single [`ChatHistoryError::SchemaMismatch`].
pub fn validate_table(
    conn: &Connection,
    table: &TableName,
    check: SchemaCheck,
) -> ChatHistoryResult<Vec<ColumnInfo>> {
    let shape = table_shape(conn, table)?.ok_or_else(|| ChatHistoryError::TableNotFound {
        table: table.to_string(),
    })?;
    let columns = table_columns(conn, table)?;

    let violations = check_columns(shape, &columns, check);
    if !violations.is_empty() {
        warn!(
            table = %table,
            violations = violations.len(),
            "Chat history table failed schema validation"
        );
        return Err(ChatHistoryError::SchemaMismatch {
            table: table.to_string(),
            violations,
        });
    }

    debug!(table = %table, columns = columns.len(), "Chat history table validated");
    Ok(columns)
}

/// Compare catalog metadata with the canonical layout.
pub fn check_columns(
    shape: TableShape,
    columns: &[ColumnInfo],
    check: SchemaCheck,
) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if shape.without_rowid {
        violations.push(SchemaViolation::WithoutRowid);
    }

    let pk_columns: Vec<&ColumnInfo> = columns.iter().filter(|c| c.pk > 0).collect();
    if pk_columns.len() > 1 {
        violations.push(SchemaViolation::CompositePrimaryKey(
            pk_columns.iter().map(|c| c.name.clone()).collect(),
        ));
    }

    for spec in CANONICAL_COLUMNS {
        let Some(column) = columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(spec.name))
        else {
            violations.push(SchemaViolation::MissingColumn(spec.name.to_string()));
            continue;
        };

        if spec.primary_key {
            // A sole primary key with no index of its own is the rowid
            let is_rowid_alias = column.pk == 1 && pk_columns.len() == 1 && !shape.pk_index;
            if pk_columns.len() <= 1 && !shape.without_rowid && !is_rowid_alias {
                violations.push(SchemaViolation::IdNotIdentity {
                    declared_type: column.declared_type.clone(),
                });
            }
            continue;
        }

        if spec.not_null && !column.not_null {
            violations.push(SchemaViolation::Nullable(spec.name.to_string()));
        }

        if check == SchemaCheck::Strict && column.affinity() != spec.affinity {
            violations.push(SchemaViolation::WrongAffinity {
                column: spec.name.to_string(),
                expected: spec.affinity,
                found: column.affinity(),
            });
        }
    }

    violations
}
