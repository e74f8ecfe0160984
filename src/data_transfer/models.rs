use crate::data_transfer::errors::BatchLoadError;
use serde::Serialize;
use std::time::Duration;

/// Rows per second, zero when no measurable time has passed.
pub fn rows_per_second(rows: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        rows as f64 / secs
    } else {
        0.0
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub processed_rows: u64,
    pub elapsed: Duration,
    pub rows_per_sec: f64,
}

impl TransferProgress {
    pub fn new(processed_rows: u64, elapsed: Duration) -> Self {
        Self {
            processed_rows,
            elapsed,
            rows_per_sec: rows_per_second(processed_rows, elapsed),
        }
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    /// 1-based position of the batch within the run.
    pub batch_number: u64,
    pub rows: usize,
    pub final_batch: bool,
    pub error: BatchLoadError,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub processed_rows: u64,
    pub loaded_rows: u64,
    pub batches: u64,
    pub failed_batches: u64,
    pub failed_rows: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    pub fn rows_per_sec(&self) -> f64 {
        rows_per_second(self.processed_rows, self.elapsed)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_batches > 0
    }
}
