use clap::Parser;
use dirsmith::cli::{CliSettings, OrganizeCommand, run_cli};
use dirsmith::organizer::OrganizeMode;
use dirsmith::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Classify files and organize them into a category hierarchy.
#[derive(Parser, Debug)]
#[command(name = "dirsmith", version, about)]
struct Cli {
    /// Directory to organize.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// How destinations are chosen.
    #[arg(long, value_enum, default_value_t = OrganizeMode::Auto)]
    mode: OrganizeMode,

    /// Descend into subdirectories.
    #[arg(short, long)]
    recursive: bool,

    /// Show what would move without touching anything.
    #[arg(long)]
    dry_run: bool,

    /// TOML file with filters and custom classification rules.
    #[arg(long, value_name = "FILE")]
    custom_rules: Option<PathBuf>,

    /// Revert the most recent organization of the directory.
    #[arg(long, conflicts_with_all = ["dry_run", "recursive"])]
    undo: bool,

    /// Confidence model file (defaults to the per-user config directory).
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Explain every classification and enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "dirsmith=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = if cli.undo {
        OrganizeCommand::Undo
    } else {
        OrganizeCommand::Organize {
            mode: cli.mode,
            recursive: cli.recursive,
            dry_run: cli.dry_run,
        }
    };
    let settings = CliSettings {
        config_path: cli.custom_rules,
        model_path: cli.model,
        verbose: cli.verbose,
    };

    match run_cli(command, &cli.path, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
