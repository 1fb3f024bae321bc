use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "doclens",
    version,
    about = "Ask questions about your documents: ingest PDFs into a vector index and query them with an LLM"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (host:port); overrides DOCLENS_BIND
        #[arg(long)]
        bind: Option<String>,
    },
    /// Ingest a document into the index, waiting for completion
    Ingest {
        /// Path to the PDF or text file
        file: PathBuf,
        /// Skip the embedding-service health check
        #[arg(long, default_value_t = false)]
        no_health_check: bool,
    },
    /// Retrieve matching chunks and generate an answer
    Query {
        /// The question to answer
        query: String,
        /// Number of chunks to retrieve
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Print retrieved chunks without calling the LLM
        #[arg(long, default_value_t = false)]
        retrieve_only: bool,
        /// Emit JSON instead of formatted text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
