//! literate CLI - block registry and tangler

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use literate::commands;
use literate::interface::Context;

#[derive(Parser)]
#[command(name = "literate")]
#[command(author, version, about = "Literate programming with inheritable tangle roots", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every output file of every tangle root
    Tangle {
        /// Dry run - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Build and tangle everything without writing
    Check,

    /// Print one tangled block
    Show {
        /// Block name
        name: String,

        /// Tangle root to tangle from
        #[arg(short, long)]
        root: Option<String>,

        /// Print the block's relations as JSON
        #[arg(long)]
        relations: bool,
    },

    /// Print the merged registry
    Dump {
        /// JSON output
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let base_dir = cli
        .directory
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let ctx = match Context::load(base_dir, cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Tangle { dry_run } => {
            commands::tangle(&ctx, commands::TangleOptions { dry_run })
        }

        Commands::Check => commands::check(&ctx),

        Commands::Show {
            name,
            root,
            relations,
        } => {
            let options = commands::ShowOptions {
                name,
                tangle_root: root,
                relations,
            };
            commands::show(&ctx, options)
        }

        Commands::Dump { json } => commands::dump(&ctx, commands::DumpOptions { json }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
