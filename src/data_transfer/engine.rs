use crate::config::TransferConfig;
use crate::data_transfer::cursor::QueryCursor;
use crate::data_transfer::errors::TransferError;
use crate::data_transfer::loader::{load_batch, BulkLoadTarget};
use crate::data_transfer::models::{BatchFailure, TransferProgress, TransferSummary};
use crate::data_transfer::observer::TransferObserver;
use crate::db_types::{Row, TableIdentifier};
use crate::postgres::PgCopyTarget;
use futures::{Stream, StreamExt};
use sqlx::{Pool, Postgres};
use std::time::Instant;

/// Running state for one transfer.
struct TransferSession {
    started: Instant,
    processed_rows: u64,
    loaded_rows: u64,
    batches: u64,
    failed_batches: u64,
    failed_rows: u64,
}

impl TransferSession {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            processed_rows: 0,
            loaded_rows: 0,
            batches: 0,
            failed_batches: 0,
            failed_rows: 0,
        }
    }

    /// Loads and clears `batch`. A failed load is reported and the rows are
    /// dropped; they still count as processed.
    async fn flush_batch<T, O>(
        &mut self,
        target: &T,
        table: &TableIdentifier,
        columns: &[String],
        batch: &mut Vec<Row>,
        final_batch: bool,
        observer: &O,
    ) where
        T: BulkLoadTarget + ?Sized,
        O: TransferObserver + ?Sized,
    {
        let rows = batch.len();
        self.batches += 1;

        match load_batch(target, table, columns, batch).await {
            Ok(inserted) => self.loaded_rows += inserted,
            Err(error) => {
                self.failed_batches += 1;
                self.failed_rows += rows as u64;
                observer.on_batch_failed(&BatchFailure {
                    batch_number: self.batches,
                    rows,
                    final_batch,
                    error,
                });
            }
        }

        self.processed_rows += rows as u64;
        batch.clear();
    }

    fn progress(&self) -> TransferProgress {
        TransferProgress::new(self.processed_rows, self.started.elapsed())
    }

    fn finish(self) -> TransferSummary {
        TransferSummary {
            processed_rows: self.processed_rows,
            loaded_rows: self.loaded_rows,
            batches: self.batches,
            failed_batches: self.failed_batches,
            failed_rows: self.failed_rows,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Drains `rows` into the destination in batches of `config.batch_size`.
///
/// Batch failures are reported to the observer and skipped. The first
/// error coming out of `rows` ends the transfer and is returned as is.
pub async fn transfer_rows<S, T, O>(
    rows: S,
    columns: &[String],
    target: &T,
    config: &TransferConfig,
    observer: &O,
) -> Result<TransferSummary, TransferError>
where
    S: Stream<Item = Result<Row, TransferError>>,
    T: BulkLoadTarget + ?Sized,
    O: TransferObserver + ?Sized,
{
    let batch_size = config.batch_size.get();
    let progress_every = config.progress_every_rows.get();

    let mut rows = std::pin::pin!(rows);
    let mut session = TransferSession::start();
    let mut batch: Vec<Row> = Vec::with_capacity(batch_size);

    while let Some(row) = rows.next().await {
        batch.push(row?);
        if batch.len() < batch_size {
            continue;
        }

        session
            .flush_batch(target, &config.dest_table, columns, &mut batch, false, observer)
            .await;

        if session.processed_rows % progress_every == 0 {
            observer.on_progress(&session.progress());
        }
    }

    if !batch.is_empty() {
        session
            .flush_batch(target, &config.dest_table, columns, &mut batch, true, observer)
            .await;
    }

    let summary = session.finish();
    observer.on_finished(&summary);
    Ok(summary)
}

/// Runs the configured query against `pool` and copies its rows into the
/// destination table through the same pool.
pub async fn run_transfer<O>(
    pool: &Pool<Postgres>,
    config: &TransferConfig,
    observer: &O,
) -> Result<TransferSummary, TransferError>
where
    O: TransferObserver + ?Sized,
{
    observer.on_started(config);

    let mut conn = pool.acquire().await.map_err(TransferError::Query)?;
    let cursor = QueryCursor::open(&mut *conn, &config.select_query).await?;
    let columns = cursor.columns().to_vec();
    observer.on_columns(&columns);

    let target = PgCopyTarget::new(pool.clone());
    transfer_rows(cursor.into_rows(), &columns, &target, config, observer).await
}
