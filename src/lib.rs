//! Streams the result of one read query into a PostgreSQL table.
//!
//! Rows are pulled from a streaming cursor, grouped into fixed-size batches
//! and written with `COPY ... FROM STDIN`, so memory stays bounded by the
//! batch size no matter how large the result set is. A batch that fails to
//! load is reported and skipped; a cursor failure ends the run.

pub mod config;
pub mod data_transfer;
pub mod db_types;
pub mod postgres;
pub mod sql_utils;

pub use config::{SummaryFormat, TransferArgs, TransferConfig};
pub use data_transfer::{
    run_transfer, transfer_rows, BatchLoadError, LogObserver, TransferError, TransferObserver,
    TransferSummary,
};
pub use db_types::{Row, SqlValue, TableIdentifier};
