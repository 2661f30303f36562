mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata", version, about = "Knowledge graph and context server for layered markdown vaults")]
struct Cli {
    /// Config file (defaults to ~/.strata/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport: "stdio" or "http" (overrides config)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Build the knowledge graph from the vault
    Build {
        /// Reuse parses cached earlier in this process (a fresh CLI run has none)
        #[arg(long)]
        incremental: bool,
    },
    /// Spreading-activation query from seed terms
    Query {
        /// Document paths, title fragments, or tags
        #[arg(required = true)]
        seeds: Vec<String>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long)]
        max_hops: Option<usize>,
        /// Only show documents in these layers
        #[arg(long = "layer", value_parser = clap::value_parser!(u8).range(1..=5))]
        layers: Vec<u8>,
    },
    /// Assemble token-bounded context for a free-text query
    Context {
        query: String,
        #[arg(long)]
        token_budget: Option<usize>,
        /// Include full document bodies instead of excerpts
        #[arg(long)]
        full: bool,
    },
    /// Show graph size and freshness
    Status,
    /// Show a document's links and hierarchy
    Navigate {
        /// Vault-relative document path
        id: String,
        /// Also show parents, children, and siblings
        #[arg(long)]
        hierarchy: bool,
    },
    /// Mark a written file stale (for post-write hooks)
    MarkStale {
        /// Name of the tool that wrote the file
        #[arg(long, default_value = "Write")]
        tool: String,
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::StrataConfig::load_from(path)?,
        None => config::StrataConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "http" | "sse" => server::serve_http(config).await?,
                other => anyhow::bail!("unknown transport {other:?}, expected \"stdio\" or \"http\""),
            }
        }
        Command::Build { incremental } => cli::build::build(&config, incremental)?,
        Command::Query {
            seeds,
            max_results,
            max_hops,
            layers,
        } => cli::query::query(&config, &seeds, max_results, max_hops, &layers)?,
        Command::Context {
            query,
            token_budget,
            full,
        } => cli::context::context(&config, &query, token_budget, full)?,
        Command::Status => cli::status::status(&config)?,
        Command::Navigate { id, hierarchy } => cli::navigate::navigate(&config, &id, hierarchy)?,
        Command::MarkStale { tool, path } => cli::mark_stale::mark_stale(&config, &tool, &path)?,
    }

    Ok(())
}
