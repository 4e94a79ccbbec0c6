//! Undo functionality for reverting the most recent organization run.
//!
//! Undo replays the latest journal block for a directory in reverse. A record
//! is only replayed when the file is still where the run put it and nothing
//! has since taken its original place; anything else is skipped and reported.
use crate::error::{OrganizeError, OrganizeResult, UndoError};
use crate::journal::{Journal, JournalEntry, OperationRecord, UndoMarker};
use crate::organizer::{move_file, validate_directory};
use chrono::Utc;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// The run that was reversed.
    pub run_id: Uuid,
    /// Number of files successfully restored.
    pub restored: usize,
    /// Records left alone because the file moved on or its old slot is taken.
    pub skipped: Vec<UndoError>,
    /// Records whose restore was attempted and failed.
    pub failed: Vec<UndoError>,
    /// Destination directories removed because the undo emptied them.
    pub removed_dirs: usize,
}

impl UndoReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            restored: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
            removed_dirs: 0,
        }
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum Restore {
    Restored,
    Skipped(String),
    Failed(String),
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent not-yet-undone run over `root`.
    ///
    /// Returns [`OrganizeError::NothingToUndo`] when the journal holds no such
    /// run. When no record failed, the block is marked undone so the next undo
    /// reaches the run before it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsmith::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/directory")) {
    ///     Ok(report) => println!("Restored {} files", report.restored),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(root: &Path) -> OrganizeResult<UndoReport> {
        let root = validate_directory(root)?;
        let journal = Journal::for_root(&root);
        let block = journal
            .latest_block(&root)?
            .ok_or_else(|| OrganizeError::NothingToUndo { path: root.clone() })?;

        tracing::info!(
            "Undoing run {} ({} records) in {}",
            block.header.run_id,
            block.records.len(),
            root.display()
        );

        let mut report = UndoReport::new(block.header.run_id);
        for record in block.records.iter().rev() {
            match Self::restore_record(record) {
                Restore::Restored => report.restored += 1,
                Restore::Skipped(reason) => {
                    tracing::warn!("Skipping {}: {}", record.destination.display(), reason);
                    report.skipped.push(UndoError {
                        path: record.destination.clone(),
                        reason,
                    });
                }
                Restore::Failed(reason) => {
                    tracing::warn!("Cannot restore {}: {}", record.destination.display(), reason);
                    report.failed.push(UndoError {
                        path: record.destination.clone(),
                        reason,
                    });
                }
            }
        }

        let created_dirs: BTreeSet<PathBuf> = block
            .records
            .iter()
            .flat_map(|record| record.created_dirs.iter().cloned())
            .collect();
        report.removed_dirs = remove_created_dirs(&root, created_dirs);

        if report.failed.is_empty() {
            journal.append(&JournalEntry::Undone(UndoMarker {
                run_id: block.header.run_id,
                timestamp: Utc::now(),
            }))?;
        }
        Ok(report)
    }

    fn restore_record(record: &OperationRecord) -> Restore {
        if !record.destination.exists() {
            return Restore::Skipped("file is no longer at its organized location".to_string());
        }
        if record.source.exists() {
            return Restore::Skipped("original location is occupied".to_string());
        }
        match move_file(&record.destination, &record.source) {
            Ok(()) => Restore::Restored,
            Err(e) => Restore::Failed(e.to_string()),
        }
    }
}

/// Removes run-created directories that are empty again, children before
/// parents. Directories outside `root` are left alone.
fn remove_created_dirs(root: &Path, dirs: BTreeSet<PathBuf>) -> usize {
    let mut removed = 0;
    // A parent sorts before its children, so reverse order visits children first.
    for dir in dirs.iter().rev() {
        if dir == root || !dir.starts_with(root) {
            continue;
        }
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty && fs::remove_dir(dir).is_ok() {
            removed += 1;
        }
    }
    removed
}
