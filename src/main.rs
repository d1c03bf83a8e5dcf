use anyhow::Result;
use backupbuddy::{BackupContext, commands};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use colored::Colorize;
use std::io;
use std::process;

#[derive(Parser)]
#[command(
    name = "bbud",
    version = backupbuddy::VERSION,
    about = "Snapshot-diff backup staging for manually synced drives",
    long_about = "Tracks folders per backup location, diffs them against their last \
                  snapshot, and stages a transfer package (additions + deletion \
                  manifests) to copy to the destination by hand"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Track folders under a backup location
    Add {
        /// Backup location name
        location: String,

        /// Folder paths to track
        paths: Vec<String>,
    },

    /// Stop tracking folders under a backup location
    Rm {
        /// Backup location name
        location: String,

        /// Folder paths to untrack
        paths: Vec<String>,
    },

    /// List the folders tracked by a backup location
    List {
        /// Backup location name
        location: String,
    },

    /// Seed snapshots without producing a changeset
    Init {
        /// Backup location name
        location: String,

        /// Specific folders to (re)initialize; all tracked folders if omitted
        paths: Vec<String>,
    },

    /// Scan, diff and stage a transfer package for a location
    Backup {
        /// Backup location name
        location: String,
    },

    /// Apply deletion manifests against a destination root
    ApplyDeletions {
        /// Destination root directory (where the backup lives)
        root: String,

        /// Deletion manifest files to apply
        manifests: Vec<String>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Wire up structured logging from the `BACKUPBUDDY_LOG` environment
/// variable (e.g. `BACKUPBUDDY_LOG=debug`). `--verbose` raises the default
/// to debug; otherwise only warnings surface.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("BACKUPBUDDY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Completion and apply-deletions work without any local state
    let context = match &cli.command {
        Commands::Completion { .. } | Commands::ApplyDeletions { .. } => None,
        _ => Some(BackupContext::new()?),
    };

    match cli.command {
        Commands::Add { location, paths } => {
            let ctx = context.unwrap();
            commands::add::execute(&ctx, &location, &paths)?;
        }
        Commands::Rm { location, paths } => {
            let ctx = context.unwrap();
            commands::rm::execute(&ctx, &location, &paths)?;
        }
        Commands::List { location } => {
            let ctx = context.unwrap();
            commands::list::execute(&ctx, &location)?;
        }
        Commands::Init { location, paths } => {
            let ctx = context.unwrap();
            commands::init::execute(&ctx, &location, &paths)?;
        }
        Commands::Backup { location } => {
            let ctx = context.unwrap();
            commands::backup::execute(&ctx, &location)?;
        }
        Commands::ApplyDeletions { root, manifests } => {
            commands::apply::execute(&root, &manifests)?;
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
