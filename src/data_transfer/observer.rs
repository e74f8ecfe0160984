use crate::config::TransferConfig;
use crate::data_transfer::models::{BatchFailure, TransferProgress, TransferSummary};

/// Receives everything the transfer reports while it runs.
///
/// All methods default to doing nothing so callers only implement the
/// events they care about.
pub trait TransferObserver: Send + Sync {
    fn on_started(&self, _config: &TransferConfig) {}

    fn on_columns(&self, _columns: &[String]) {}

    fn on_progress(&self, _progress: &TransferProgress) {}

    fn on_batch_failed(&self, _failure: &BatchFailure) {}

    fn on_finished(&self, _summary: &TransferSummary) {}
}

/// Writes transfer events through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TransferObserver for LogObserver {
    fn on_started(&self, config: &TransferConfig) {
        log::info!("Destination table: {}", config.dest_table);
        log::info!("Select query: {}", config.select_query);
        log::info!("Batch size: {}", config.batch_size);
    }

    fn on_columns(&self, columns: &[String]) {
        log::info!("Detected columns ({}): {}", columns.len(), columns.join(", "));
    }

    fn on_progress(&self, progress: &TransferProgress) {
        log::info!(
            "Processed: {} rows - Rate: {:.0} rows/sec",
            progress.processed_rows,
            progress.rows_per_sec
        );
    }

    fn on_batch_failed(&self, failure: &BatchFailure) {
        if failure.final_batch {
            log::error!("failed to insert final batch: {}", failure.error);
        } else {
            log::error!(
                "failed to insert batch {} ({} rows): {}",
                failure.batch_number,
                failure.rows,
                failure.error
            );
        }
    }

    fn on_finished(&self, summary: &TransferSummary) {
        log::info!(
            "Transfer complete. Total: {} rows in {:?} ({:.0} rows/sec)",
            summary.processed_rows,
            summary.elapsed,
            summary.rows_per_sec()
        );
        if summary.has_failures() {
            log::warn!(
                "{} of {} batches failed; {} rows were not inserted",
                summary.failed_batches,
                summary.batches,
                summary.failed_rows
            );
        }
    }
}
