use thiserror::Error;

/// Fatal errors: the cursor can no longer produce rows, so the run stops.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The source rejected the query while opening the cursor.
    #[error("failed to execute select query: {0}")]
    Query(#[source] sqlx::Error),

    #[error("select query returned zero columns")]
    EmptyResultSchema,

    /// A row could not be fetched or decoded mid-stream.
    #[error("failed to read row {row}: {source}")]
    Read {
        row: u64,
        #[source]
        source: sqlx::Error,
    },

    #[error("row {row} has {actual} values but the query reported {expected} columns")]
    RowShape {
        row: u64,
        expected: usize,
        actual: usize,
    },
}

impl TransferError {
    /// Which stage of the run produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            TransferError::Query(_) => "cursor open",
            TransferError::EmptyResultSchema => "schema discovery",
            TransferError::Read { .. } | TransferError::RowShape { .. } => "cursor read",
        }
    }
}

/// Per-batch failures. The batch is dropped and the transfer continues.
#[derive(Error, Debug)]
pub enum BatchLoadError {
    #[error("bulk copy failed: {0}")]
    Load(#[from] sqlx::Error),

    #[error("expected to insert {expected} rows, but inserted {inserted}")]
    RowCountMismatch { expected: u64, inserted: u64 },
}
