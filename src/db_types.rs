// =====================================================
// COMMON TRANSFER TYPES
// =====================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

pub const DEFAULT_SCHEMA: &str = "public";

/// A single cell read from the source, wide enough to hand to COPY unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal text as the server rendered it.
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(uuid::Uuid),
    /// JSON or JSONB document exactly as the server rendered it.
    Json(String),
}

/// One source row; position `i` maps onto destination column `i`.
pub type Row = Vec<SqlValue>;

// --- Destination Identifier ---
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableIdentifier {
    pub schema: String,
    pub table: String,
}

impl TableIdentifier {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Accepts `table` or `schema.table`, optionally wrapped in quotes.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_matches('"').trim_matches('\'');
        if trimmed.is_empty() {
            return Err("empty identifier".to_string());
        }

        let parts = trimmed.split('.').collect::<Vec<&str>>();
        match parts.as_slice() {
            [table] => {
                let table = table.trim();
                if table.is_empty() {
                    return Err("empty identifier".to_string());
                }
                Ok(Self::new(DEFAULT_SCHEMA, table))
            }
            [schema, table] => {
                let schema = schema.trim();
                let table = table.trim();
                if schema.is_empty() || table.is_empty() {
                    return Err("expected schema.table".to_string());
                }
                Ok(Self::new(schema, table))
            }
            _ => Err("expected table or schema.table".to_string()),
        }
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}
