//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfchat")]
#[command(about = "pdfchat - chat with your PDF documents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file, replacing .pdfchat/config.yaml and .pdfchat/local.yaml
    #[arg(short, long, global = true, env = "PDFCHAT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a local PDF and index it
    Ingest(IngestArgs),

    /// Show the context retrieved for a query
    Context(ContextArgs),

    /// Ask a question about an ingested document
    Ask(AskArgs),

    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Display name; defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ContextArgs {
    /// File key printed by `pdfchat ingest`
    #[arg(short, long)]
    pub file_key: String,

    /// Query text
    pub query: String,
}

#[derive(Args)]
pub struct AskArgs {
    /// File key printed by `pdfchat ingest`
    #[arg(short, long)]
    pub file_key: String,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Question to ask
    pub question: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind, overriding `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, overriding `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,
}
