//! Command-line interface module for dirsmith.
//!
//! Turns a parsed command into an organize or undo run and prints the
//! outcome. The binary only parses arguments and maps the result to an exit
//! code.

use crate::config::OrganizerConfig;
use crate::model::ModelStore;
use crate::organizer::{FileOutcome, OrganizeMode, OrganizeOptions, Organizer};
use crate::output::OutputFormatter;
use crate::undo::UndoManager;
use std::path::{Path, PathBuf};

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy)]
pub enum OrganizeCommand {
    /// Organize files in a directory.
    Organize {
        mode: OrganizeMode,
        recursive: bool,
        /// If true, simulate the operation without making changes.
        dry_run: bool,
    },
    /// Undo the previous organization.
    Undo,
}

/// File locations a run reads besides the target directory.
#[derive(Debug, Clone, Default)]
pub struct CliSettings {
    /// Configuration file with filters and custom rules.
    pub config_path: Option<PathBuf>,
    /// Confidence model file; the per-user default when absent.
    pub model_path: Option<PathBuf>,
    /// Print the classification behind every decision.
    pub verbose: bool,
}

impl CliSettings {
    fn model_store(&self) -> ModelStore {
        match &self.model_path {
            Some(path) => ModelStore::at(path),
            None => ModelStore::user_default(),
        }
    }
}

/// Runs the CLI application with the given command and directory path.
///
/// Returns `Err` with a printable message when the run could not start or
/// when any file failed to move.
///
/// # Examples
///
/// ```no_run
/// use dirsmith::cli::{CliSettings, OrganizeCommand, run_cli};
/// use dirsmith::organizer::OrganizeMode;
/// use std::path::Path;
///
/// let command = OrganizeCommand::Organize {
///     mode: OrganizeMode::Auto,
///     recursive: false,
///     dry_run: true,
/// };
/// if let Err(e) = run_cli(command, Path::new("/path/to/directory"), &CliSettings::default()) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path, settings: &CliSettings) -> Result<(), String> {
    match command {
        OrganizeCommand::Organize {
            mode,
            recursive,
            dry_run,
        } => organize_directory(
            dir_path,
            &OrganizeOptions {
                mode,
                recursive,
                dry_run,
                ..Default::default()
            },
            settings,
        ),
        OrganizeCommand::Undo => undo_organization(dir_path),
    }
}

fn organize_directory(
    base_path: &Path,
    options: &OrganizeOptions,
    settings: &CliSettings,
) -> Result<(), String> {
    let config = OrganizerConfig::load(settings.config_path.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;

    let organizer = Organizer::new(base_path, config, settings.model_store())
        .map_err(|e| e.to_string())?;
    let organizer = if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of {} ({} mode)",
            organizer.root().display(),
            options.mode
        ));
        organizer
    } else {
        OutputFormatter::info(&format!(
            "Organizing contents of {} ({} mode)",
            organizer.root().display(),
            options.mode
        ));
        organizer.with_progress(OutputFormatter::create_progress_bar(0))
    };

    let report = organizer.run(options).map_err(|e| e.to_string())?;

    if report.files.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    OutputFormatter::header(if options.dry_run {
        "Files would be organized as follows:"
    } else {
        "Files organized:"
    });
    for file in &report.files {
        OutputFormatter::file_line(&report.root, file);
        if settings.verbose {
            OutputFormatter::classification_line(&file.classification);
        }
    }

    let counts = report.category_counts();
    OutputFormatter::summary_table(&counts, counts.values().sum());

    let unchanged = report
        .files
        .iter()
        .filter(|file| matches!(file.outcome, FileOutcome::AlreadyOrganized { .. }))
        .count();
    if unchanged > 0 {
        OutputFormatter::plain(&format!("{} already organized", unchanged));
    }
    if report.cancelled {
        OutputFormatter::warning("Run cancelled before all files were processed.");
    }

    if options.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
        OutputFormatter::plain(&format!(
            "Run 'dirsmith {} --mode {}' (without --dry-run) to execute the organization.",
            base_path.display(),
            options.mode
        ));
        return Ok(());
    }

    if report.has_failures() {
        for failure in report.failures() {
            OutputFormatter::error(&failure.to_string());
        }
        return Err(format!(
            "{} files could not be organized",
            report.failures().count()
        ));
    }

    OutputFormatter::success(&format!("Organization complete in {:.2?}.", report.duration));
    if report.moved_count() > 0 {
        OutputFormatter::plain(&format!(
            "Use 'dirsmith {} --undo' to revert changes.",
            base_path.display()
        ));
    }
    Ok(())
}

fn undo_organization(base_path: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    let report = UndoManager::undo(base_path).map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!("Restored: {}", report.restored));

    if !report.skipped.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped.len()));
        for skipped in &report.skipped {
            OutputFormatter::plain(&format!("    - {}", skipped));
        }
    }

    if !report.failed.is_empty() {
        for failed in &report.failed {
            OutputFormatter::error(&failed.to_string());
        }
        return Err(format!(
            "{} files could not be restored; the run stays available for another undo",
            report.failed.len()
        ));
    }

    Ok(())
}
