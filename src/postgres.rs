// =====================================================
// POSTGRESQL CONNECTION, DECODING AND BULK COPY
// =====================================================

use crate::data_transfer::errors::TransferError;
use crate::data_transfer::loader::BulkLoadTarget;
use crate::db_types::{Row, SqlValue, TableIdentifier};
use crate::sql_utils::{build_copy_statement, write_copy_row};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolCopyExt, PgPoolOptions, PgRow};
use sqlx::{ConnectOptions, Pool, Postgres, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;

/// Text is flushed to the server once a chunk grows past this size.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

// --- Connection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
        }
    }
}

pub async fn create_pool(database_url: &str, limits: PoolLimits) -> Result<Pool<Postgres>, String> {
    let options = PgConnectOptions::from_str(database_url)
        .map_err(|e| format!("Failed to parse connection string: {}", e))?
        .log_statements(log::LevelFilter::Debug);

    let host = options.get_host().to_string();
    let port = options.get_port();

    PgPoolOptions::new()
        .max_connections(limits.max_connections)
        .min_connections(limits.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await
        .map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("connection refused") {
                return format!("Connection Refused\n\nCheck if PostgreSQL is running on {}:{}", host, port);
            }
            if err_msg.contains("timed out") {
                return format!("Connection Timed Out\n\nThe server at {}:{} did not respond within 10 seconds.", host, port);
            }
            format!("Failed to connect to database: {}", e)
        })
}

// --- Row Decoding ---

/// Decodes one result row into owned values, checking its width against
/// the columns discovered when the cursor was opened.
pub fn decode_row(row: &PgRow, expected_columns: usize, row_number: u64) -> Result<Row, TransferError> {
    let actual = row.len();
    if actual != expected_columns {
        return Err(TransferError::RowShape {
            row: row_number,
            expected: expected_columns,
            actual,
        });
    }

    (0..actual)
        .map(|index| {
            decode_value(row, index).map_err(|source| TransferError::Read {
                row: row_number,
                source,
            })
        })
        .collect()
}

fn decode_value(row: &PgRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOL" => SqlValue::Bool(row.try_get_unchecked::<bool, _>(index)?),
        "INT2" => SqlValue::Int(i64::from(row.try_get_unchecked::<i16, _>(index)?)),
        "INT4" => SqlValue::Int(i64::from(row.try_get_unchecked::<i32, _>(index)?)),
        "INT8" => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
        "FLOAT4" => SqlValue::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "FLOAT8" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        "NUMERIC" => SqlValue::Numeric(row.try_get_unchecked::<String, _>(index)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            SqlValue::Text(row.try_get_unchecked::<String, _>(index)?)
        }
        "BYTEA" => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        // chrono has no infinity, BC years or 24:00:00; those stay as text.
        "DATE" => typed_or_text(row, index, SqlValue::Date)?,
        "TIME" => typed_or_text(row, index, SqlValue::Time)?,
        "TIMESTAMP" => typed_or_text(row, index, SqlValue::Timestamp)?,
        "TIMESTAMPTZ" => typed_or_text(row, index, SqlValue::TimestampTz)?,
        "UUID" => SqlValue::Uuid(row.try_get_unchecked::<uuid::Uuid, _>(index)?),
        // Parsing would round big numbers and merge duplicate `json` keys.
        "JSON" | "JSONB" => SqlValue::Json(row.try_get_unchecked::<String, _>(index)?),
        // Intervals, arrays, enums, ranges, network types: keep the server's
        // own text rendering so nothing is narrowed on the way to COPY.
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };

    Ok(value)
}

/// Decodes as `T`, or keeps the server's text when `T` cannot hold the value.
fn typed_or_text<'r, T>(
    row: &'r PgRow,
    index: usize,
    wrap: fn(T) -> SqlValue,
) -> Result<SqlValue, sqlx::Error>
where
    T: sqlx::Decode<'r, Postgres>,
{
    match row.try_get_unchecked::<T, _>(index) {
        Ok(value) => Ok(wrap(value)),
        Err(sqlx::Error::ColumnDecode { .. }) => {
            Ok(SqlValue::Text(row.try_get_unchecked::<String, _>(index)?))
        }
        Err(e) => Err(e),
    }
}

// --- Bulk Copy ---

/// Bulk loads through `COPY ... FROM STDIN` on connections from the pool.
#[derive(Debug, Clone)]
pub struct PgCopyTarget {
    pool: Pool<Postgres>,
}

impl PgCopyTarget {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BulkLoadTarget for PgCopyTarget {
    async fn copy_rows(
        &self,
        table: &TableIdentifier,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, sqlx::Error> {
        let statement = build_copy_statement(table, columns);
        let mut copy = self.pool.copy_in_raw(&statement).await?;

        let mut buffer = String::with_capacity(COPY_CHUNK_BYTES * 2);
        for row in rows {
            write_copy_row(row, &mut buffer);
            if buffer.len() < COPY_CHUNK_BYTES {
                continue;
            }

            let sent = copy.send(buffer.as_bytes()).await.map(|_| ());
            if let Err(e) = sent {
                let _ = copy.abort(e.to_string()).await;
                return Err(e);
            }
            buffer.clear();
        }

        if !buffer.is_empty() {
            let sent = copy.send(buffer.as_bytes()).await.map(|_| ());
            if let Err(e) = sent {
                let _ = copy.abort(e.to_string()).await;
                return Err(e);
            }
        }

        copy.finish().await
    }
}

#[cfg(test)]
mod tests;
