//! Output formatting and styling module.
//!
//! All user-facing terminal output goes through [`OutputFormatter`]. Library
//! diagnostics go through `tracing` instead and stay quiet by default.

use crate::classifier::{ClassificationResult, ClassificationSource};
use crate::file_category::Category;
use crate::organizer::{FileOutcome, FileReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Progress bar for the move phase.
    ///
    /// ```no_run
    /// use dirsmith::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// One line per file, relative to the organized root.
    pub fn file_line(root: &Path, file: &FileReport) {
        let name = relative(root, &file.path);
        let (marker, detail) = match &file.outcome {
            FileOutcome::Moved { destination } => {
                ("→".green(), relative(root, destination).normal())
            }
            FileOutcome::WouldMove { destination } => (
                "→".yellow(),
                format!("would move to {}", relative(root, destination)).normal(),
            ),
            FileOutcome::AlreadyOrganized { existing } => (
                "=".dimmed(),
                format!("already organized at {}", relative(root, existing)).dimmed(),
            ),
            FileOutcome::Skipped { reason } => ("-".yellow(), reason.as_str().yellow()),
            FileOutcome::Failed(error) => ("✗".red(), error.reason.as_str().red()),
        };
        println!(" {} {} {}", name, marker, detail);
    }

    /// Classification details shown in verbose mode.
    pub fn classification_line(result: &ClassificationResult) {
        let label = match &result.subcategory {
            Some(sub) => format!("{}/{}", result.category, sub),
            None => result.category.to_string(),
        };
        let source = match result.source {
            ClassificationSource::Rule => "rule",
            ClassificationSource::Ensemble => "ensemble",
        };
        println!(
            "     {} {}% ({}: {})",
            label.cyan(),
            result.confidence,
            source,
            result.rationale.dimmed()
        );
    }

    /// Prints a summary table with file counts per destination tag.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            let file_word = if *count == 1 { "file" } else { "files" };
            let description = Category::from_dir_name(category)
                .map(|category| format!("  {}", category.description().dimmed()))
                .unwrap_or_default();
            println!(
                "{:<width$} | {} {}{}",
                category,
                count.to_string().green(),
                file_word,
                description,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
