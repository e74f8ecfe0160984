use crate::data_transfer::errors::TransferError;
use crate::db_types::Row;
use crate::postgres::decode_row;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Executor, Statement};

/// A forward-only cursor over one query's result set.
///
/// The cursor borrows a single connection for as long as it lives; the
/// connection goes back to the pool when its owner drops it, whether the
/// rows were drained, abandoned, or failed.
pub struct QueryCursor<'c> {
    columns: Vec<String>,
    rows: BoxStream<'c, Result<PgRow, sqlx::Error>>,
    rows_read: u64,
}

impl<'c> QueryCursor<'c> {
    /// Discovers the result columns, then starts streaming rows.
    pub async fn open(conn: &'c mut PgConnection, query: &'c str) -> Result<Self, TransferError> {
        let columns = discover_columns(&mut *conn, query).await?;

        // Simple-protocol rows arrive in text format, which COPY text accepts as-is.
        let rows = sqlx::raw_sql(query).fetch(conn);

        Ok(Self {
            columns,
            rows,
            rows_read: 0,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Fetches and decodes the next row. `None` once the result set is drained.
    pub async fn next_row(&mut self) -> Option<Result<Row, TransferError>> {
        let next = self.rows.next().await?;
        self.rows_read += 1;
        let row_number = self.rows_read;

        let decoded = next
            .map_err(|source| TransferError::Read {
                row: row_number,
                source,
            })
            .and_then(|row| decode_row(&row, self.columns.len(), row_number));
        Some(decoded)
    }

    pub fn into_rows(self) -> BoxStream<'c, Result<Row, TransferError>> {
        stream::unfold(self, |mut cursor| async move {
            let item = cursor.next_row().await?;
            Some((item, cursor))
        })
        .boxed()
    }
}

async fn discover_columns(conn: &mut PgConnection, query: &str) -> Result<Vec<String>, TransferError> {
    let statement = conn.prepare(query).await.map_err(TransferError::Query)?;
    let columns = statement
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect::<Vec<String>>();

    if columns.is_empty() {
        return Err(TransferError::EmptyResultSchema);
    }

    Ok(columns)
}
