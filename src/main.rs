use clap::Parser;
use log::{error, info};
use query_transfer::postgres;
use query_transfer::{run_transfer, LogObserver, SummaryFormat, TransferArgs};
use std::process;

#[tokio::main]
async fn main() {
    // Read before the logger exists so RUST_LOG from .env is honoured.
    let dotenv = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if dotenv.is_err() {
        info!("No .env file found, using environment variables");
    }

    let args = TransferArgs::parse();

    let config = match args.validate() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    let limits = match args.pool_limits() {
        Ok(limits) => limits,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let pool = match postgres::create_pool(&config.database_url, limits).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("Connected to database");

    let result = run_transfer(&pool, &config, &LogObserver).await;
    pool.close().await;

    match result {
        Ok(summary) => {
            if args.summary_format == SummaryFormat::Json {
                match serde_json::to_string(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!("Failed to encode summary: {}", e),
                }
            }
            info!("Data transfer completed successfully");
        }
        Err(e) => {
            error!("Transfer failed during {}: {}", e.stage(), e);
            process::exit(1);
        }
    }
}
