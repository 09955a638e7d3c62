//! # screenkit CLI
//!
//! Command-line interface for checking and running screen definitions.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "screenkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "screenkit.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the actions of a screen definition without running them
    Check {
        /// Screen definition (YAML or JSON)
        definition: PathBuf,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Run a screen definition's actions and print the resulting context
    Run {
        /// Screen definition (YAML or JSON)
        definition: PathBuf,

        /// JSON object used as the initial context
        #[arg(long)]
        context: Option<PathBuf>,

        /// Widget trail (comma separated, outermost first)
        #[arg(long, value_delimiter = ',')]
        trail: Vec<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check { definition, json } => commands::check_definition(&definition, json),
        Commands::Run {
            definition,
            context,
            trail,
            pretty,
        } => {
            let opts = commands::RunOptions {
                context,
                trail,
                pretty,
            };
            commands::run_definition(&cli.config, &definition, opts)
        }
    }
}
