use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use doclens::cli::{run_ingest, run_query, run_serve, Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("doclens=info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Serve { bind } => run_serve(bind).await,
        Command::Ingest {
            file,
            no_health_check,
        } => run_ingest(&file, no_health_check).await,
        Command::Query {
            query,
            k,
            retrieve_only,
            json,
        } => run_query(&query, k, retrieve_only, json).await,
    }
}
