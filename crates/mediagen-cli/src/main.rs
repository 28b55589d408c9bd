//! mediagen CLI — entry point.
//!
//! # Commands
//!
//! - `mediagen generate --model KEY --prompt TEXT [...]` — run one generation job
//! - `mediagen models [--kind image|video]` — list supported models
//! - `mediagen status` — show configuration and provider key status
//! - `mediagen init` — write a default config file

mod generate;
mod helpers;
mod init;
mod models;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use mediagen_core::types::GenerationKind;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Generate images and videos through KIE.ai and Gemini
#[derive(Parser)]
#[command(name = "mediagen", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.mediagen/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one generation job and print the artifact URL
    Generate(generate::GenerateArgs),

    /// List supported models
    Models {
        /// Only show models of this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show configuration and provider status
    Status,

    /// Write a default config file if none exists
    Init,
}

/// `--kind` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Image,
    Video,
}

impl From<KindArg> for GenerationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => GenerationKind::Image,
            KindArg::Video => GenerationKind::Video,
        }
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Generate(args) => {
            init_logging(args.logs);
            generate::run(args, config_path.as_deref()).await
        }
        Commands::Models { kind } => {
            models::run(kind.map(GenerationKind::from));
            Ok(())
        }
        Commands::Status => {
            init_logging(false);
            status::run(config_path.as_deref())
        }
        Commands::Init => init::run(config_path.as_deref()),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("mediagen=debug,mediagen_core=debug,mediagen_providers=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
