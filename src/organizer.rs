//! Run orchestration: scan, classify, plan, move, journal.
//!
//! Classification is pure per file and runs on the rayon pool. Planning,
//! moves and journal appends happen on the calling thread in walk order, so a
//! preview and a real run see the same sequence of decisions.

use crate::classifier::{ClassificationResult, RuleClassifier};
use crate::config::{CompiledConfig, CompiledFilters};
use crate::context::{ContextBooster, ProjectMarkers};
use crate::ensemble::EnsembleClassifier;
use crate::error::{MoveError, OrganizeError, OrganizeResult};
use crate::features::{ContentHint, FeatureSet, NamePattern};
use crate::file_category::FileMapper;
use crate::inspector::{ContentFacts, ContentSniffer, InferSniffer, Inspector};
use crate::journal::{BlockFooter, BlockHeader, JOURNAL_FILE, Journal, JournalEntry, OperationRecord};
use crate::model::ModelStore;
use crate::pipeline::Pipeline;
use crate::planner::{PathPlanner, Placement, destination_dir};
use chrono::{Local, Utc};
use clap::ValueEnum;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;
use walkdir::WalkDir;

/// How destinations are chosen.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OrganizeMode {
    /// Full classification pipeline into the category hierarchy.
    #[default]
    Auto,
    /// Extension table only, one directory per category.
    Type,
    /// `YYYY/YYYY-MM` from the modification time.
    Date,
    /// One directory per size bucket.
    Size,
    /// Source-tree skeleton: src, tests, docs, config, scripts, assets, build.
    Project,
}

impl fmt::Display for OrganizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrganizeMode::Auto => "auto",
            OrganizeMode::Type => "type",
            OrganizeMode::Date => "date",
            OrganizeMode::Size => "size",
            OrganizeMode::Project => "project",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one run, reported through `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning,
    Classifying,
    Applying,
    Previewing,
    Logged,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    pub mode: OrganizeMode,
    pub recursive: bool,
    pub dry_run: bool,
    /// Checked before each move; set it to stop a run between files.
    pub cancel: Arc<AtomicBool>,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Moved { destination: PathBuf },
    WouldMove { destination: PathBuf },
    AlreadyOrganized { existing: PathBuf },
    Skipped { reason: String },
    Failed(MoveError),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub classification: ClassificationResult,
    /// Top-level destination tag: a category, a year, a size bucket or a
    /// project directory depending on the mode.
    pub tag: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone)]
pub struct OrganizeReport {
    pub run_id: Uuid,
    pub root: PathBuf,
    pub mode: OrganizeMode,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub duration: Duration,
    pub cancelled: bool,
}

impl OrganizeReport {
    /// Files moved, or that would be moved in a preview, per tag.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            if matches!(
                file.outcome,
                FileOutcome::Moved { .. } | FileOutcome::WouldMove { .. }
            ) {
                *counts.entry(file.tag.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn moved_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Moved { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MoveError> {
        self.files.iter().filter_map(|file| match &file.outcome {
            FileOutcome::Failed(error) => Some(error),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// A classified file waiting for its turn in the serialized phase.
struct Pending {
    path: PathBuf,
    facts: ContentFacts,
    features: FeatureSet,
    classification: ClassificationResult,
    directory: PathBuf,
    tag: String,
}

/// Organizes one directory.
pub struct Organizer {
    root: PathBuf,
    filters: CompiledFilters,
    pipeline: Pipeline,
    mapper: FileMapper,
    model_store: ModelStore,
    journal: Journal,
    progress: Option<ProgressBar>,
}

impl Organizer {
    /// Prepares a run over `root` with magic-byte content sniffing.
    pub fn new(root: &Path, config: CompiledConfig, model_store: ModelStore) -> OrganizeResult<Self> {
        Self::with_sniffer(root, config, model_store, Box::new(InferSniffer))
    }

    pub fn with_sniffer(
        root: &Path,
        config: CompiledConfig,
        model_store: ModelStore,
        sniffer: Box<dyn ContentSniffer>,
    ) -> OrganizeResult<Self> {
        let root = validate_directory(root)?;
        let now = Local::now();
        let model = model_store.load(Utc::now());
        let markers = ProjectMarkers::scan(&root);
        tracing::debug!(
            "Project markers in {}: {} of 4 groups",
            root.display(),
            markers.count()
        );

        let mapper = FileMapper::default();
        let pipeline = Pipeline::new(
            Inspector::new(sniffer, now),
            RuleClassifier::new(config.rules),
            EnsembleClassifier::new(mapper.clone()),
            ContextBooster::new(markers),
            model,
        );

        Ok(Self {
            journal: Journal::for_root(&root),
            root,
            filters: config.filters,
            pipeline,
            mapper,
            model_store,
            progress: None,
        })
    }

    /// Reports per-file progress during the move phase.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn run(&self, options: &OrganizeOptions) -> OrganizeResult<OrganizeReport> {
        let run_id = Uuid::new_v4();
        log_phase(run_id, options.mode, RunPhase::Scanning);
        let paths = self.scan(options.recursive);
        self.run_paths(run_id, paths, options)
    }

    /// Classifies, plans and moves `paths` in the given order.
    fn run_paths(
        &self,
        run_id: Uuid,
        paths: Vec<PathBuf>,
        options: &OrganizeOptions,
    ) -> OrganizeResult<OrganizeReport> {
        let started = Instant::now();
        let phase = |phase: RunPhase| log_phase(run_id, options.mode, phase);

        phase(RunPhase::Classifying);
        let pending: Vec<Pending> = paths
            .par_iter()
            .map(|path| self.prepare(path, options.mode))
            .collect();

        phase(if options.dry_run {
            RunPhase::Previewing
        } else {
            RunPhase::Applying
        });
        if let Some(progress) = &self.progress {
            progress.set_length(pending.len() as u64);
        }

        let mut planner = PathPlanner::new(&self.root, self.pipeline.inspector().now());
        let planned_files = pending.len();
        let mut header_written = false;
        let mut cancelled = false;
        let mut files = Vec::with_capacity(planned_files);

        for item in pending {
            if !cancelled && options.cancel.load(Ordering::SeqCst) {
                tracing::warn!("Run {} cancelled, remaining files left in place", run_id);
                cancelled = true;
            }

            let outcome = if cancelled {
                FileOutcome::Skipped {
                    reason: "run cancelled".to_string(),
                }
            } else if !item.facts.readable {
                FileOutcome::Skipped {
                    reason: "file could not be read".to_string(),
                }
            } else {
                match planner.plan(&item.path, &item.directory, &item.features, item.facts.modified)
                {
                    Err(e) => FileOutcome::Failed(MoveError {
                        source_path: item.path.clone(),
                        destination: self.root.join(&item.directory),
                        reason: e.to_string(),
                    }),
                    Ok(Placement::AlreadyOrganized { existing }) => {
                        FileOutcome::AlreadyOrganized { existing }
                    }
                    Ok(Placement::Move { destination }) if options.dry_run => {
                        FileOutcome::WouldMove { destination }
                    }
                    Ok(Placement::Move { destination }) => {
                        if !header_written {
                            self.journal.append(&JournalEntry::Header(BlockHeader {
                                run_id,
                                timestamp: Utc::now(),
                                mode: options.mode,
                                target: self.root.clone(),
                                planned_files,
                            }))?;
                            header_written = true;
                        }
                        self.apply_move(run_id, options.mode, &item, destination)?
                    }
                }
            };

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
            files.push(FileReport {
                path: item.path,
                classification: item.classification,
                tag: item.tag,
                outcome,
            });
        }

        let report = OrganizeReport {
            run_id,
            root: self.root.clone(),
            mode: options.mode,
            dry_run: options.dry_run,
            files,
            duration: started.elapsed(),
            cancelled,
        };

        if header_written {
            self.journal.append(&JournalEntry::Footer(BlockFooter {
                run_id,
                file_count: report.moved_count(),
                duration_seconds: report.duration.as_secs_f64(),
            }))?;
        }
        if !options.dry_run {
            let mut model = self.pipeline.model().clone();
            model.touch(Utc::now());
            if let Err(e) = self.model_store.save(&model) {
                tracing::warn!("{}", e);
            }
        }
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        phase(RunPhase::Logged);
        tracing::info!(
            "Run {} over {}: {} files, {} moved, {} failed in {:.2?}",
            run_id,
            self.root.display(),
            report.files.len(),
            report.moved_count(),
            report.failures().count(),
            report.duration
        );
        phase(RunPhase::Idle);
        Ok(report)
    }

    /// Moves one file and journals it. A move that cannot be journaled is
    /// rolled back and aborts the run.
    fn apply_move(
        &self,
        run_id: Uuid,
        mode: OrganizeMode,
        item: &Pending,
        destination: PathBuf,
    ) -> OrganizeResult<FileOutcome> {
        let created_dirs = destination.parent().map(missing_dirs).unwrap_or_default();
        if let Err(e) = move_file(&item.path, &destination) {
            tracing::warn!(
                "Cannot move {} to {}: {}",
                item.path.display(),
                destination.display(),
                e
            );
            return Ok(FileOutcome::Failed(MoveError {
                source_path: item.path.clone(),
                destination,
                reason: e.to_string(),
            }));
        }

        let record = OperationRecord {
            run_id,
            source: item.path.clone(),
            destination: destination.clone(),
            category: item.tag.clone(),
            confidence: (mode == OrganizeMode::Auto).then_some(item.classification.confidence),
            timestamp: Utc::now(),
            created_dirs,
        };
        if let Err(e) = self.journal.append(&JournalEntry::Move(record.clone())) {
            if let Err(rollback) = move_file(&destination, &item.path) {
                tracing::warn!(
                    "Cannot roll back {} after journal failure: {}",
                    destination.display(),
                    rollback
                );
            }
            for dir in &record.created_dirs {
                let _ = fs::remove_dir(dir);
            }
            return Err(e);
        }

        tracing::debug!("Moved {} to {}", item.path.display(), destination.display());
        Ok(FileOutcome::Moved { destination })
    }

    /// Regular files under the root in file-name order. Symlinks are never
    /// followed and hidden directories are never entered.
    fn scan(&self, recursive: bool) -> Vec<PathBuf> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let journal_path = self.root.join(JOURNAL_FILE);

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| *path != journal_path)
            .filter(|path| {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                self.filters.should_include(relative)
            })
            .collect()
    }

    fn prepare(&self, path: &Path, mode: OrganizeMode) -> Pending {
        let classified = self.pipeline.classify_path(path);
        let (directory, tag) = match mode {
            OrganizeMode::Auto => {
                let result = &classified.result;
                (
                    destination_dir(result.category, result.subcategory.as_deref()),
                    result.category.dir_name().to_string(),
                )
            }
            OrganizeMode::Type => {
                let category = self.mapper.categorize(
                    classified.features.mime().as_deref(),
                    classified.features.extension.as_deref(),
                );
                (
                    PathBuf::from(category.dir_name()),
                    category.dir_name().to_string(),
                )
            }
            OrganizeMode::Date => match classified.facts.modified {
                Some(modified) => {
                    let year = modified.format("%Y").to_string();
                    (
                        Path::new(&year).join(modified.format("%Y-%m").to_string()),
                        year,
                    )
                }
                None => (PathBuf::from("undated"), "undated".to_string()),
            },
            OrganizeMode::Size => {
                let bucket = classified.facts.size_class.dir_name();
                (PathBuf::from(bucket), bucket.to_string())
            }
            OrganizeMode::Project => {
                let dir = project_dir(&classified.features);
                (PathBuf::from(dir), dir.to_string())
            }
        };

        Pending {
            path: path.to_path_buf(),
            facts: classified.facts,
            features: classified.features,
            classification: classified.result,
            directory,
            tag,
        }
    }
}

fn log_phase(run_id: Uuid, mode: OrganizeMode, phase: RunPhase) {
    tracing::info!(run_id = %run_id, mode = %mode, ?phase, "run phase");
}

const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bash", "zsh", "fish", "ps1", "bat", "cmd"];
const BUILD_EXTENSIONS: &[&str] = &[
    "o", "obj", "a", "so", "dll", "dylib", "exe", "class", "jar", "pyc", "wasm", "whl",
];
const DOC_EXTENSIONS: &[&str] = &["md", "rst", "adoc", "txt", "pdf"];
const CONFIG_EXTENSIONS: &[&str] = &[
    "toml", "yaml", "ini", "cfg", "conf", "env", "properties", "lock",
];

/// Project-mode directory for a file.
fn project_dir(features: &FeatureSet) -> &'static str {
    if features.name_pattern == NamePattern::Test {
        "tests"
    } else if features.name_pattern == NamePattern::Documentation
        || features.extension_in(DOC_EXTENSIONS)
    {
        "docs"
    } else if features.extension_in(SCRIPT_EXTENSIONS) {
        "scripts"
    } else if features.name_pattern == NamePattern::Config
        || features.content_hint == ContentHint::Config
        || features.extension_in(CONFIG_EXTENSIONS)
    {
        "config"
    } else if features.language.is_some() {
        "src"
    } else if features.extension_in(BUILD_EXTENSIONS) {
        "build"
    } else if ["image", "audio", "video", "font"]
        .iter()
        .any(|kind| features.mime_is(kind))
    {
        "assets"
    } else {
        "misc"
    }
}

/// Canonical form of an existing directory.
pub(crate) fn validate_directory(path: &Path) -> OrganizeResult<PathBuf> {
    let invalid = |reason: String| OrganizeError::InvalidDirectory {
        path: path.to_path_buf(),
        reason,
    };
    let metadata = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    path.canonicalize().map_err(|e| invalid(e.to_string()))
}

/// Ancestors of `dir`, itself included, that do not exist yet. Deepest first.
pub(crate) fn missing_dirs(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
        .map(Path::to_path_buf)
        .collect()
}

/// Renames `source` to `destination`, creating parent directories. Falls back
/// to copy and delete across file systems.
pub(crate) fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    if destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }

    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}
