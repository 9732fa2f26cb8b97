//! metadef: keep metaobject definitions in declaration files and sync them
//! with a shop.
//!
//! # Usage
//!
//! ```text
//! metadef --shop <shop> [--config <path>] [-v] pull [--out <file> | --split <dir>]
//! metadef --shop <shop> [--config <path>] [-v] diff <file-or-dir>
//! metadef --shop <shop> [--config <path>] [-v] push <file-or-dir> [--dry-run]
//! ```

mod client;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use client::AdminClient;
use commands::{diff::DiffArgs, pull::PullArgs, push::PushArgs};
use metadef_core::{config, SessionConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "metadef",
    version,
    about = "Pull, diff and push metaobject definitions as declaration files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    shop: ShopArgs,

    /// Log debug detail to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the shop's definitions as declarations.
    Pull(PullArgs),

    /// Show how local declarations differ from the shop.
    Diff(DiffArgs),

    /// Create and update definitions so the shop matches local declarations.
    Push(PushArgs),
}

// ---------------------------------------------------------------------------
// Shop selection shared by every command
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct ShopArgs {
    /// Shop handle, as listed under `shops` in the config file.
    #[arg(long)]
    pub shop: String,

    /// Config file (default: ./.metaobjectsrc.yaml, then ~/.metaobjectsrc.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the Admin API GraphQL endpoint.
    #[arg(long, hide = true)]
    pub endpoint: Option<String>,
}

impl ShopArgs {
    /// Load the session for the selected shop and build its client.
    pub fn connect(&self) -> Result<(SessionConfig, AdminClient)> {
        let session = config::load_session(self.config.as_deref(), &self.shop)
            .with_context(|| format!("failed to load configuration for shop '{}'", self.shop))?;
        let client = match &self.endpoint {
            Some(endpoint) => AdminClient::with_endpoint(&session, endpoint.clone()),
            None => AdminClient::new(&session),
        };
        tracing::debug!("using endpoint {}", client.endpoint());
        Ok((session, client))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Pull(args) => args.run(&cli.shop),
        Commands::Diff(args) => args.run(&cli.shop),
        Commands::Push(args) => args.run(&cli.shop),
    }
}

/// Logs go to stderr so `pull` output on stdout stays clean.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
