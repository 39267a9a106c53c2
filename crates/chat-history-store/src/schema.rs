//! Canonical chat history table layout.
//!
//! A history table has exactly three required columns:
//!
//! | column       | declaration                            |
//! |--------------|----------------------------------------|
//! | `id`         | `INTEGER PRIMARY KEY AUTOINCREMENT`    |
//! | `session_id` | `VARCHAR(128) NOT NULL`                |
//! | `data`       | `TEXT NOT NULL`                        |
//!
//! Extra columns are tolerated. Table names never reach SQL text unless they
//! went through [`TableName::parse`]; everything else is a bound parameter.

use crate::{ChatHistoryError, ChatHistoryResult};
use std::fmt;

pub const ID_COLUMN: &str = "id";
pub const SESSION_ID_COLUMN: &str = "session_id";
pub const DATA_COLUMN: &str = "data";

/// Upper bound on session id length, matching `VARCHAR(128)`.
pub const SESSION_ID_MAX_LEN: usize = 128;

/// Upper bound on table name length.
pub const TABLE_NAME_MAX_LEN: usize = 128;

/// Schema every table lookup and statement is pinned to, so a TEMP table of
/// the same name never shadows the history table.
pub const MAIN_SCHEMA: &str = "main";

const RESERVED_PREFIX: &str = "sqlite_";

/// SQLite column type affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    /// Derive the affinity SQLite assigns to a declared column type.
    ///
    /// Rules are applied in SQLite's order, so `CHARINT` is INTEGER.
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            Self::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Self::Real
        } else {
            Self::Numeric
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
            Self::Real => "REAL",
            Self::Numeric => "NUMERIC",
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required column of the canonical layout.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub declared_type: &'static str,
    pub affinity: Affinity,
    pub not_null: bool,
    pub primary_key: bool,
}

pub const CANONICAL_COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec {
        name: ID_COLUMN,
        declared_type: "INTEGER",
        affinity: Affinity::Integer,
        not_null: false,
        primary_key: true,
    },
    ColumnSpec {
        name: SESSION_ID_COLUMN,
        declared_type: "VARCHAR(128)",
        affinity: Affinity::Text,
        not_null: true,
        primary_key: false,
    },
    ColumnSpec {
        name: DATA_COLUMN,
        declared_type: "TEXT",
        affinity: Affinity::Text,
        not_null: true,
        primary_key: false,
    },
];

/// Catalog facts about a table beyond its column list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableShape {
    /// Declared `WITHOUT ROWID` (`wr` in `pragma_table_list`).
    pub without_rowid: bool,
    /// The primary key is backed by its own index (`origin = 'pk'` in
    /// `pragma_index_list`). A rowid alias never is.
    pub pk_index: bool,
}

/// Column metadata as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
}

impl ColumnInfo {
    pub fn affinity(&self) -> Affinity {
        Affinity::from_declared_type(&self.declared_type)
    }
}

/// How much of the canonical layout the validator insists on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaCheck {
    /// Column presence, nullability, and an auto-generated integer `id`.
    #[default]
    Minimal,
    /// Everything in `Minimal` plus TEXT affinity for `session_id` and `data`.
    Strict,
}

/// A single way in which a table departs from the canonical layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingColumn(String),
    /// `id` is not an alias for the rowid, so the database will not generate it.
    IdNotIdentity { declared_type: String },
    CompositePrimaryKey(Vec<String>),
    WithoutRowid,
    Nullable(String),
    WrongAffinity {
        column: String,
        expected: Affinity,
        found: Affinity,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(name) => write!(f, "missing column {}", name),
            Self::IdNotIdentity { declared_type } => write!(
                f,
                "id must be declared INTEGER PRIMARY KEY, found {:?}",
                declared_type
            ),
            Self::CompositePrimaryKey(columns) => {
                write!(f, "primary key spans several columns ({})", columns.join(", "))
            }
            Self::WithoutRowid => write!(f, "table is declared WITHOUT ROWID"),
            Self::Nullable(name) => write!(f, "{} must be NOT NULL", name),
            Self::WrongAffinity {
                column,
                expected,
                found,
            } => write!(f, "{} has {} affinity, expected {}", column, found, expected),
        }
    }
}

/// A validated SQL identifier naming a chat history table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Accept `[A-Za-z_][A-Za-z0-9_]*`, rejecting SQLite's reserved prefix.
    pub fn parse(name: &str) -> ChatHistoryResult<Self> {
        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ChatHistoryError::InvalidTableName(format!(
                "{:?} must match [A-Za-z_][A-Za-z0-9_]*",
                name
            )));
        }
        if name.len() > TABLE_NAME_MAX_LEN {
            return Err(ChatHistoryError::InvalidTableName(format!(
                "{:?} is longer than {} characters",
                name, TABLE_NAME_MAX_LEN
            )));
        }
        if name.to_ascii_lowercase().starts_with(RESERVED_PREFIX) {
            return Err(ChatHistoryError::InvalidTableName(format!(
                "{:?} uses the reserved {} prefix",
                name, RESERVED_PREFIX
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for interpolation into SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Quoted and pinned to the main schema, for use in statements.
    pub fn qualified(&self) -> String {
        format!("{}.{}", MAIN_SCHEMA, self.quoted())
    }

    pub fn index_name(&self) -> String {
        format!("\"idx_{}_session_id\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check a session id fits the `session_id` column.
pub fn validate_session_id(session_id: &str) -> ChatHistoryResult<()> {
    if session_id.is_empty() {
        return Err(ChatHistoryError::InvalidSessionId(
            "session id must not be empty".to_string(),
        ));
    }
    if session_id.len() > SESSION_ID_MAX_LEN {
        return Err(ChatHistoryError::InvalidSessionId(format!(
            "session id is {} bytes, limit is {}",
            session_id.len(),
            SESSION_ID_MAX_LEN
        )));
    }
    Ok(())
}

fn column_definition(spec: &ColumnSpec) -> String {
    let mut definition = format!("{} {}", spec.name, spec.declared_type);
    if spec.primary_key {
        definition.push_str(" PRIMARY KEY AUTOINCREMENT");
    }
    if spec.not_null {
        definition.push_str(" NOT NULL");
    }
    definition
}

/// `CREATE TABLE IF NOT EXISTS` statement for the canonical layout.
pub fn create_table_sql(table: &TableName) -> String {
    let columns: Vec<String> = CANONICAL_COLUMNS.iter().map(column_definition).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table.qualified(),
        columns.join(", ")
    )
}

/// Index serving per-session reads in `id` order.
pub fn create_index_sql(table: &TableName) -> String {
    // The schema goes on the index name; the ON table must be unqualified.
    format!(
        "CREATE INDEX IF NOT EXISTS {}.{} ON {} ({}, {})",
        MAIN_SCHEMA,
        table.index_name(),
        table.quoted(),
        SESSION_ID_COLUMN,
        ID_COLUMN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_rules() {
        assert_eq!(Affinity::from_declared_type("INTEGER"), Affinity::Integer);
        assert_eq!(Affinity::from_declared_type("bigint"), Affinity::Integer);
        assert_eq!(Affinity::from_declared_type("VARCHAR(128)"), Affinity::Text);
        assert_eq!(Affinity::from_declared_type("VARCHAR2(128)"), Affinity::Text);
        assert_eq!(Affinity::from_declared_type("CLOB"), Affinity::Text);
        assert_eq!(Affinity::from_declared_type(""), Affinity::Blob);
        assert_eq!(Affinity::from_declared_type("DOUBLE"), Affinity::Real);
        assert_eq!(Affinity::from_declared_type("NUMBER"), Affinity::Numeric);
        // INT wins over CHAR
        assert_eq!(Affinity::from_declared_type("CHARINT"), Affinity::Integer);
    }

    #[test]
    fn test_table_name_accepts_identifiers() {
        for name in ["message_store", "_hidden", "Chat2", "message_store_abcdef"] {
            let table = TableName::parse(name).unwrap();
            assert_eq!(table.as_str(), name);
            assert_eq!(table.quoted(), format!("\"{}\"", name));
            assert_eq!(table.qualified(), format!("main.\"{}\"", name));
        }
    }

    #[test]
    fn test_table_name_rejects_injection() {
        for name in [
            "",
            "1table",
            "messages; DROP TABLE users",
            "messages\"",
            "my-table",
            "sqlite_master",
            "SQLITE_sequence",
            "tab le",
        ] {
            let err = TableName::parse(name).unwrap_err();
            assert!(
                matches!(err, ChatHistoryError::InvalidTableName(_)),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_table_name_length_limit() {
        let ok = "t".repeat(TABLE_NAME_MAX_LEN);
        assert!(TableName::parse(&ok).is_ok());
        let too_long = "t".repeat(TABLE_NAME_MAX_LEN + 1);
        assert!(TableName::parse(&too_long).is_err());
    }

    #[test]
    fn test_session_id_bounds() {
        assert!(validate_session_id("test").is_ok());
        assert!(validate_session_id(&"s".repeat(SESSION_ID_MAX_LEN)).is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id(&"s".repeat(SESSION_ID_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_create_table_sql_matches_canonical_columns() {
        let table = TableName::parse("message_store").unwrap();
        let sql = create_table_sql(&table);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS main.\"message_store\" (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             session_id VARCHAR(128) NOT NULL, \
             data TEXT NOT NULL)"
        );
        assert!(CANONICAL_COLUMNS[1]
            .declared_type
            .contains(&SESSION_ID_MAX_LEN.to_string()));

        let index = create_index_sql(&table);
        assert_eq!(
            index,
            "CREATE INDEX IF NOT EXISTS main.\"idx_message_store_session_id\" \
             ON \"message_store\" (session_id, id)"
        );
    }
}
