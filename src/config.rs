//! Command line and environment configuration.
//!
//! Every flag can also be supplied through the environment variable named
//! next to it, so a `.env` file is enough to drive a run.

use crate::db_types::TableIdentifier;
use crate::postgres::PoolLimits;
use clap::{Parser, ValueEnum};
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser as SqlParser;
use std::fmt;
use std::num::{NonZeroU64, NonZeroUsize};

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(5000) {
    Some(value) => value,
    None => unreachable!(),
};
pub const DEFAULT_PROGRESS_EVERY_ROWS: NonZeroU64 = match NonZeroU64::new(1_000_000) {
    Some(value) => value,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct TransferArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Read query whose columns line up with the destination columns
    #[arg(long, env = "SELECT_QUERY")]
    pub select_query: Option<String>,

    /// Destination table, `table` or `schema.table`
    #[arg(long, env = "DEST_TABLE")]
    pub dest_table: Option<String>,

    /// Rows per COPY call
    #[arg(long, env = "BATCH_SIZE", value_parser = parse_batch_size, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: NonZeroUsize,

    /// Report throughput every this many rows
    #[arg(
        long,
        env = "PROGRESS_EVERY_ROWS",
        value_parser = parse_progress_every_rows,
        default_value_t = DEFAULT_PROGRESS_EVERY_ROWS
    )]
    pub progress_every_rows: NonZeroU64,

    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    #[arg(long, env = "MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Also print the final summary to stdout in this format
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub summary_format: SummaryFormat,
}

/// Validated settings for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub database_url: String,
    pub select_query: String,
    pub dest_table: TableIdentifier,
    pub batch_size: NonZeroUsize,
    pub progress_every_rows: NonZeroU64,
}

// The connection string usually carries a password.
impl fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferConfig")
            .field("database_url", &"<redacted>")
            .field("select_query", &self.select_query)
            .field("dest_table", &self.dest_table)
            .field("batch_size", &self.batch_size)
            .field("progress_every_rows", &self.progress_every_rows)
            .finish()
    }
}

impl TransferConfig {
    pub fn new(
        database_url: impl Into<String>,
        select_query: impl Into<String>,
        dest_table: TableIdentifier,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            select_query: select_query.into(),
            dest_table,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_every_rows: DEFAULT_PROGRESS_EVERY_ROWS,
        }
    }

    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_progress_every_rows(mut self, progress_every_rows: NonZeroU64) -> Self {
        self.progress_every_rows = progress_every_rows;
        self
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required(value: Option<&str>, name: &str, hint: &str) -> Result<String, String> {
    normalized(value).ok_or_else(|| format!("{} environment variable is required{}", name, hint))
}

/// A blank value falls back to `default`, so `BATCH_SIZE=` behaves like unset.
fn parse_non_zero<T>(value: &str, name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
{
    match normalized(Some(value)) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("invalid {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

pub fn parse_batch_size(value: &str) -> Result<NonZeroUsize, String> {
    parse_non_zero(value, "BATCH_SIZE", DEFAULT_BATCH_SIZE)
}

pub fn parse_progress_every_rows(value: &str) -> Result<NonZeroU64, String> {
    parse_non_zero(value, "PROGRESS_EVERY_ROWS", DEFAULT_PROGRESS_EVERY_ROWS)
}

/// Rejects queries that parse but are not a single query statement.
///
/// Input the parser does not understand is left for the server to judge.
pub fn check_select_query(query: &str) -> Result<(), String> {
    let statements = match SqlParser::parse_sql(&PostgreSqlDialect {}, query) {
        Ok(statements) => statements,
        Err(e) => {
            log::warn!("Could not pre-check SELECT_QUERY, sending it as is: {}", e);
            return Ok(());
        }
    };

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [] => Err("SELECT_QUERY contains no statement".to_string()),
        [_] => Err("SELECT_QUERY must be a read-only query".to_string()),
        _ => Err(format!(
            "SELECT_QUERY must be a single query, found {} statements",
            statements.len()
        )),
    }
}

impl TransferArgs {
    pub fn pool_limits(&self) -> Result<PoolLimits, String> {
        if self.max_connections < 2 {
            return Err("MAX_CONNECTIONS must be at least 2 (one for the cursor, one for COPY)".to_string());
        }
        if self.min_connections > self.max_connections {
            return Err(format!(
                "MIN_CONNECTIONS ({}) cannot exceed MAX_CONNECTIONS ({})",
                self.min_connections, self.max_connections
            ));
        }
        Ok(PoolLimits {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
        })
    }

    pub fn validate(&self) -> Result<TransferConfig, String> {
        let database_url = required(self.database_url.as_deref(), "DATABASE_URL", "")?;
        let select_query = required(self.select_query.as_deref(), "SELECT_QUERY", "")?;
        let dest_table_raw = required(
            self.dest_table.as_deref(),
            "DEST_TABLE",
            " (e.g. pm.snmp_metrics_interface)",
        )?;
        let dest_table = TableIdentifier::parse(&dest_table_raw)
            .map_err(|e| format!("invalid DEST_TABLE: {}", e))?;

        check_select_query(&select_query)?;

        Ok(TransferConfig {
            database_url,
            select_query,
            dest_table,
            batch_size: self.batch_size,
            progress_every_rows: self.progress_every_rows,
        })
    }
}
