//! Append-only operation journal, one JSON object per line.
//!
//! A run that moves files writes a `header` line, one `move` line per
//! executed move and a closing `footer` line. Undo appends an `undone` line
//! naming the run it reversed. Nothing is ever rewritten in place.
//!
//! ```text
//! {"kind":"header","run_id":"…","timestamp":"…","mode":"auto","target":"/home/me/Downloads","planned_files":3}
//! {"kind":"move","run_id":"…","source":"…/report_final.txt","destination":"…/documents/final/report_final.txt","category":"documents","confidence":92,"timestamp":"…","created_dirs":["…/documents/final","…/documents"]}
//! {"kind":"footer","run_id":"…","file_count":1,"duration_seconds":0.012}
//! ```

use crate::error::{OrganizeError, OrganizeResult};
use crate::organizer::OrganizeMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Journal file name inside the organized directory.
pub const JOURNAL_FILE: &str = ".dirsmith_journal.jsonl";

/// Opens a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: OrganizeMode,
    pub target: PathBuf,
    pub planned_files: usize,
}

/// One executed move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub run_id: Uuid,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Destination directory tag, e.g. `documents` or `2024`.
    pub category: String,
    /// Absent for modes that do not classify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    pub timestamp: DateTime<Utc>,
    /// Directories this move had to create, deepest first. Undo prunes only these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_dirs: Vec<PathBuf>,
}

/// Closes a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFooter {
    pub run_id: Uuid,
    pub file_count: usize,
    pub duration_seconds: f64,
}

/// Marks a block as reversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoMarker {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JournalEntry {
    Header(BlockHeader),
    Move(OperationRecord),
    Footer(BlockFooter),
    Undone(UndoMarker),
}

/// A run's entries reassembled from the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalBlock {
    pub header: BlockHeader,
    pub records: Vec<OperationRecord>,
    pub footer: Option<BlockFooter>,
}

/// Handle to the journal file of one directory.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn for_root(root: &Path) -> Self {
        Self {
            path: root.join(JOURNAL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: io::Error) -> OrganizeError {
        OrganizeError::Journal {
            path: self.path.clone(),
            source,
        }
    }

    /// Appends one line and flushes it.
    pub fn append(&self, entry: &JournalEntry) -> OrganizeResult<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| self.error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error(e))?;
        writeln!(file, "{}", line).map_err(|e| self.error(e))?;
        file.flush().map_err(|e| self.error(e))
    }

    /// Reads every parseable entry. Damaged lines are skipped with a warning.
    pub fn read_entries(&self) -> OrganizeResult<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(
                        "Skipping damaged journal line {} in {}: {}",
                        index + 1,
                        self.path.display(),
                        e
                    );
                    None
                }
            })
            .collect())
    }

    /// The most recent block for `target` that has not been undone.
    pub fn latest_block(&self, target: &Path) -> OrganizeResult<Option<JournalBlock>> {
        let entries = self.read_entries()?;

        let undone: HashSet<Uuid> = entries
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Undone(marker) => Some(marker.run_id),
                _ => None,
            })
            .collect();

        let Some(header) = entries.iter().rev().find_map(|entry| match entry {
            JournalEntry::Header(header)
                if header.target.as_path() == target && !undone.contains(&header.run_id) =>
            {
                Some(header.clone())
            }
            _ => None,
        }) else {
            return Ok(None);
        };

        let mut records = Vec::new();
        let mut footer = None;
        for entry in entries {
            match entry {
                JournalEntry::Move(record) if record.run_id == header.run_id => {
                    records.push(record)
                }
                JournalEntry::Footer(f) if f.run_id == header.run_id => footer = Some(f),
                _ => {}
            }
        }

        Ok(Some(JournalBlock {
            header,
            records,
            footer,
        }))
    }
}
