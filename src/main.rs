//! # Groundwork CLI (`gw`)
//!
//! The `gw` binary is the primary interface for Groundwork. It provides
//! commands for one-shot questions, corpus inspection, and starting the
//! chat server.
//!
//! ## Usage
//!
//! ```bash
//! gw --config ./config/gw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gw chat "<message>"` | Answer one question with sources |
//! | `gw stats` | Print corpus statistics |
//! | `gw docs` | List loaded documents with chunk counts |
//! | `gw serve http` | Start the HTTP chat server |
//!
//! ## Examples
//!
//! ```bash
//! # Ask against the local docs directory
//! gw chat "How do I deploy the service?" --config ./config/gw.toml
//!
//! # Show the decision trace (agent mode)
//! gw chat "what is related to node42?" --trace
//!
//! # Start the chat server
//! gw serve http --config ./config/gw.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use groundwork::{chat_cmd, config, server, stats};

/// Groundwork CLI — a local-first retrieval-grounded question answering
/// service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/gw.example.toml` for a full example; when the file is
/// absent, built-in defaults apply.
#[derive(Parser)]
#[command(
    name = "gw",
    about = "Groundwork — a local-first retrieval-grounded question answering service",
    version,
    long_about = "Groundwork answers natural-language questions by grounding an LLM call in \
    passages retrieved from a local directory of text/markdown documents, with an optional \
    agent layer that routes requests between a text-retrieval tool and a graph-lookup tool."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/gw.toml`. Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/gw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Answer one question and print the answer with sources.
    Chat {
        /// The question to answer.
        message: String,

        /// Also print the decision trace (stages, timings, summaries).
        #[arg(long)]
        trace: bool,
    },

    /// Print corpus statistics.
    ///
    /// Shows document and chunk counts, the selected vectorizer, and the
    /// corpus fingerprint. Useful for verifying the retrieval set before
    /// serving traffic.
    Stats,

    /// List loaded documents with chunk counts.
    Docs,

    /// Start the HTTP chat server.
    ///
    /// Exposes `POST /chat` and `GET /health` on the configured bind
    /// address.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Serve the JSON chat API over HTTP.
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groundwork=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Chat { message, trace } => {
            chat_cmd::run_chat(&cfg, &message, trace).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Docs => {
            stats::run_docs(&cfg)?;
        }
        Commands::Serve { service } => match service {
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
