//! Meshchart CLI - package Meshery designs as Helm charts

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod util;

#[derive(Parser)]
#[command(name = "meshchart")]
#[command(author = "Meshchart Contributors")]
#[command(version)]
#[command(about = "Package Meshery designs as Helm charts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a design file into a packaged Helm chart
    Convert {
        /// Design (pattern) file, YAML or JSON
        pattern: PathBuf,

        /// Output file or directory (default: ./<name>-<version>.tgz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Application data root (default: ~/.meshery)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Package with the helm binary instead of in-process
        #[arg(long)]
        helm: bool,

        /// Path to the helm binary
        #[arg(long, default_value = "helm")]
        helm_bin: PathBuf,
    },

    /// Show the contents of a chart archive
    Inspect {
        /// Chart archive (.tgz)
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Convert {
            pattern,
            output,
            root,
            config,
            helm,
            helm_bin,
        } => commands::convert::run(
            &pattern,
            output.as_deref(),
            root.as_deref(),
            config.as_deref(),
            helm.then_some(helm_bin.as_path()),
        ),

        Commands::Inspect { archive, json } => commands::inspect::run(&archive, json),
    }
}
