pub mod cursor;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod models;
pub mod observer;

pub use engine::{run_transfer, transfer_rows};
pub use errors::{BatchLoadError, TransferError};
pub use models::{BatchFailure, TransferProgress, TransferSummary};
pub use observer::{LogObserver, TransferObserver};
