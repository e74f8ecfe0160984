use crate::data_transfer::errors::BatchLoadError;
use crate::db_types::{Row, TableIdentifier};
use async_trait::async_trait;

/// A destination that can ingest many rows in one bulk call.
#[async_trait]
pub trait BulkLoadTarget: Send + Sync {
    /// Copies `rows` into `table`, mapping values positionally onto
    /// `columns`, and returns the row count the destination reports.
    async fn copy_rows(
        &self,
        table: &TableIdentifier,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, sqlx::Error>;
}

/// Loads one batch and checks the destination accepted every row.
///
/// An empty batch is a no-op and never reaches the target.
pub async fn load_batch<T>(
    target: &T,
    table: &TableIdentifier,
    columns: &[String],
    rows: &[Row],
) -> Result<u64, BatchLoadError>
where
    T: BulkLoadTarget + ?Sized,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let inserted = target.copy_rows(table, columns, rows).await?;
    let expected = rows.len() as u64;
    if inserted != expected {
        return Err(BatchLoadError::RowCountMismatch { expected, inserted });
    }

    Ok(inserted)
}
