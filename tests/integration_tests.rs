use chrono::{Local, TimeZone};
use dirsmith::cli::{CliSettings, OrganizeCommand, run_cli};
use dirsmith::journal::{JOURNAL_FILE, JournalEntry};
use dirsmith::model::ModelStore;
use dirsmith::organizer::{FileOutcome, OrganizeMode, OrganizeOptions, OrganizeReport, Organizer};
use dirsmith::undo::UndoManager;
use dirsmith::{Category, ClassificationSource, Journal, OrganizeError, OrganizerConfig};
/// Integration tests for dirsmith
///
/// These tests drive complete organize and undo runs against temporary
/// directories, through both the library API and the CLI entry point.
///
/// Test categories:
/// 1. Basic organization and the classification examples
/// 2. Collision handling
/// 3. Dry-run parity and idempotence
/// 4. Journal and undo
/// 5. Alternative modes
/// 6. Configuration and filtering
/// 7. Edge cases and error scenarios
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to organize plus a separate one for the config and
/// confidence model, so neither shows up in a scan.
struct TestFixture {
    temp_dir: TempDir,
    state_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            state_dir: TempDir::new().expect("Failed to create state directory"),
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn model_path(&self) -> PathBuf {
        self.state_dir.path().join("confidence_model.json")
    }

    /// Writes the run configuration and returns its path.
    fn write_config(&self, content: &str) -> PathBuf {
        let config_path = self.state_dir.path().join("config.toml");
        fs::write(&config_path, content).expect("Failed to write config");
        config_path
    }

    fn settings(&self, config: &str) -> CliSettings {
        CliSettings {
            config_path: Some(self.write_config(config)),
            model_path: Some(self.model_path()),
            verbose: false,
        }
    }

    fn organizer(&self, config: &str) -> Organizer {
        let compiled = OrganizerConfig::load(Some(&self.write_config(config)))
            .expect("Failed to load config")
            .compile()
            .expect("Failed to compile config");
        Organizer::new(self.path(), compiled, ModelStore::at(self.model_path()))
            .expect("Failed to create organizer")
    }

    fn organize(&self, mode: OrganizeMode, dry_run: bool) -> OrganizeReport {
        self.organize_with(mode, dry_run, false, "")
    }

    fn organize_with(
        &self,
        mode: OrganizeMode,
        dry_run: bool,
        recursive: bool,
        config: &str,
    ) -> OrganizeReport {
        self.organizer(config)
            .run(&OrganizeOptions {
                mode,
                recursive,
                dry_run,
                ..Default::default()
            })
            .expect("Run failed")
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn set_modified(&self, name: &str, time: SystemTime) {
        File::options()
            .write(true)
            .open(self.path().join(name))
            .expect("Failed to open file")
            .set_modified(time)
            .expect("Failed to set modification time");
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count directories in the test directory (non-recursive).
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .count()
    }

    /// Relative path → content of every file except the journal.
    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        Self::walk_dir(self.path(), self.path(), &mut files);
        files
    }

    fn walk_dir(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    if path.file_name().is_some_and(|name| name == JOURNAL_FILE) {
                        continue;
                    }
                    let relative = path.strip_prefix(root).unwrap().to_path_buf();
                    files.insert(relative, fs::read(&path).unwrap());
                } else if path.is_dir() {
                    Self::walk_dir(root, &path, files);
                }
            }
        }
    }

    fn journal_entries(&self) -> Vec<JournalEntry> {
        Journal::for_root(self.path())
            .read_entries()
            .expect("Failed to read journal")
    }
}

fn outcome_for<'a>(report: &'a OrganizeReport, name: &str) -> &'a FileOutcome {
    &report
        .files
        .iter()
        .find(|file| file.path.file_name().is_some_and(|n| n == name))
        .unwrap_or_else(|| panic!("{} not in report", name))
        .outcome
}

/// (file name, planned destination) for every moving file.
fn planned_moves(report: &OrganizeReport) -> Vec<(PathBuf, PathBuf)> {
    report
        .files
        .iter()
        .filter_map(|file| match &file.outcome {
            FileOutcome::Moved { destination } | FileOutcome::WouldMove { destination } => {
                Some((file.path.clone(), destination.clone()))
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// Test Data: Realistic File Content
// ============================================================================

/// PDF file header (minimal)
const PDF_HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// ZIP file header (minimal)
const ZIP_HEADER: &[u8] = &[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];

/// MP3 file header (minimal)
const MP3_HEADER: &[u8] = &[0xFF, 0xFB, 0x10, 0x00]; // MPEG audio sync

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

/// A real JPEG with an EXIF APP1 segment carrying `Make` and `Model`.
fn camera_jpeg(make: &str, model: &str) -> Vec<u8> {
    let mut jpeg = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(400, 300))
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");

    let tags: [(u16, &str); 2] = [(0x010F, make), (0x0110, model)];
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&(tags.len() as u16).to_le_bytes());
    let data_start = 8 + 2 + tags.len() * 12 + 4;
    let mut data = Vec::new();
    for (tag, value) in tags {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        tiff.extend_from_slice(&((data_start + data.len()) as u32).to_le_bytes());
        data.extend_from_slice(&bytes);
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&data);

    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    // Splice right after the SOI marker.
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let result = run_cli(
        OrganizeCommand::Organize {
            mode: OrganizeMode::Auto,
            recursive: false,
            dry_run: false,
        },
        fixture.path(),
        &fixture.settings(""),
    );

    assert!(result.is_ok(), "Should succeed on empty directory");
    // No moves, so the journal is never created.
    fixture.assert_file_not_exists(JOURNAL_FILE);
    assert_eq!(fixture.count_dirs(), 0, "Should have no subdirectories");
}

#[test]
fn test_final_report_lands_in_documents_final() {
    let fixture = TestFixture::new();
    fixture.create_text_file(
        "report_final.txt",
        "Quarterly report\n\nRevenue grew four percent over the previous quarter.\n",
    );

    let report = fixture.organize(OrganizeMode::Auto, false);

    fixture.assert_file_exists("documents/final/report_final.txt");
    fixture.assert_file_not_exists("report_final.txt");
    let result = &report.files[0].classification;
    assert_eq!(result.category, Category::Documents);
    assert_eq!(result.subcategory.as_deref(), Some("final"));
    assert!((85..=95).contains(&result.confidence), "{}", result.confidence);
}

#[test]
fn test_camera_photo_lands_in_photos() {
    let fixture = TestFixture::new();
    fixture.create_file("IMG_2031.jpg", &camera_jpeg("Canon", "Canon EOS 5D"));

    let report = fixture.organize(OrganizeMode::Auto, false);

    fixture.assert_file_exists("images/photos/IMG_2031.jpg");
    let result = &report.files[0].classification;
    assert_eq!(result.category, Category::Images);
    assert_eq!(result.subcategory.as_deref(), Some("photos"));
    assert!(result.confidence >= 95);
    assert!(result.rationale.contains("Canon EOS 5D"));
}

#[test]
fn test_dotfile_config_through_ensemble() {
    let fixture = TestFixture::new();
    fixture.create_text_file(
        ".toolrc.conf",
        "alias ll='ls -la'\nexport PATH=$PATH:/opt/tool/bin\n",
    );

    let report = fixture.organize_with(
        OrganizeMode::Auto,
        false,
        false,
        "[filters]\nenable_hidden_files = true\n",
    );

    let result = &report.files[0].classification;
    assert_eq!(result.source, ClassificationSource::Ensemble);
    assert_eq!(result.category, Category::Config);
    fixture.assert_file_exists("config/general/.toolrc.conf");
}

#[test]
fn test_organize_mixed_file_types() {
    let fixture = TestFixture::new();
    fixture.create_file("wallpaper.png", &png_bytes(1920, 1080));
    fixture.create_file("manual.pdf", PDF_HEADER);
    fixture.create_text_file("main.rs", "use std::io;\n\nfn main() {}\n");
    fixture.create_text_file("people.csv", "name,age\nann,31\nbob,42\n");
    fixture.create_file("site_backup.zip", ZIP_HEADER);
    fixture.create_text_file("notes.txt.swp", "swap");

    let report = fixture.organize(OrganizeMode::Auto, false);

    assert!(!report.has_failures());
    fixture.assert_file_exists("images/wallpapers/wallpaper.png");
    fixture.assert_file_exists("documents/documentation/manual.pdf");
    fixture.assert_file_exists("code/rust/main.rs");
    fixture.assert_file_exists("data/csv/people.csv");
    fixture.assert_file_exists("archives/backups/site_backup.zip");
    fixture.assert_file_exists("system/temp/notes.txt.swp");
}

#[test]
fn test_every_confidence_in_bounds() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.py", "def main():\n    pass\n");
    fixture.create_text_file("b.unknownext", "???");
    fixture.create_file("c.bin", &[0u8, 1, 2, 3]);
    fixture.create_file("d.png", &png_bytes(64, 64));

    let report = fixture.organize(OrganizeMode::Auto, true);
    assert_eq!(report.files.len(), 4);
    for file in &report.files {
        let confidence = file.classification.confidence;
        assert!((1..=99).contains(&confidence), "{}", confidence);
    }
}

// ============================================================================
// Test Suite 2: Collision Handling
// ============================================================================

#[test]
fn test_collision_never_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_text_file("documents/general/notes.txt", "older notes");
    fixture.create_text_file("notes.txt", "newer notes");

    let report = fixture.organize(OrganizeMode::Auto, false);

    assert_eq!(
        fs::read_to_string(fixture.path().join("documents/general/notes.txt")).unwrap(),
        "older notes"
    );
    let FileOutcome::Moved { destination } = outcome_for(&report, "notes.txt") else {
        panic!("notes.txt should have moved");
    };
    let name = destination.file_name().unwrap().to_string_lossy().to_string();
    // Written just now, so the time-of-day suffix applies.
    assert!(name.starts_with("notes_") && name.ends_with(".txt"), "{}", name);
    assert_eq!(name.len(), "notes_HHMMSS.txt".len());
    assert_eq!(fs::read_to_string(destination).unwrap(), "newer notes");
}

#[test]
fn test_collision_numeric_suffix_for_old_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("documents/general/notes.txt", "older notes");
    fixture.create_text_file("notes.txt", "newer notes");
    let last_year = Local.with_ymd_and_hms(2024, 2, 3, 10, 0, 0).unwrap();
    fixture.set_modified("notes.txt", SystemTime::from(last_year));

    fixture.organize(OrganizeMode::Auto, false);

    fixture.assert_file_exists("documents/general/notes.txt");
    fixture.assert_file_exists("documents/general/notes_1.txt");
}

#[test]
fn test_identical_duplicate_is_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_text_file("documents/general/dup.txt", "same bytes");
    fixture.create_text_file("dup.txt", "same bytes");

    let report = fixture.organize(OrganizeMode::Auto, false);

    assert!(matches!(
        outcome_for(&report, "dup.txt"),
        FileOutcome::AlreadyOrganized { .. }
    ));
    fixture.assert_file_exists("dup.txt");
    fixture.assert_file_not_exists(JOURNAL_FILE);
}

// ============================================================================
// Test Suite 3: Dry-Run Parity and Idempotence
// ============================================================================

#[test]
fn test_dry_run_matches_apply() {
    let fixture = TestFixture::new();
    fixture.create_text_file("documents/general/notes.txt", "older notes");
    fixture.create_text_file("notes.txt", "newer notes");
    fixture.create_text_file("report_final.txt", "Final numbers\n");
    fixture.create_file("logo.png", &png_bytes(128, 128));
    fixture.create_text_file("app.py", "import sys\n");

    let before = fixture.snapshot();
    let preview = fixture.organize(OrganizeMode::Auto, true);
    assert_eq!(fixture.snapshot(), before, "Dry run must not touch files");
    fixture.assert_file_not_exists(JOURNAL_FILE);
    assert!(!fixture.model_path().exists());

    let applied = fixture.organize(OrganizeMode::Auto, false);
    assert_eq!(planned_moves(&preview), planned_moves(&applied));
    assert_eq!(preview.category_counts(), applied.category_counts());
    assert!(fixture.model_path().exists());
}

#[test]
fn test_organize_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report_final.txt", "Final numbers\n");
    fixture.create_file("logo.png", &png_bytes(128, 128));
    fixture.create_text_file("people.csv", "name,age\nann,31\nbob,42\n");
    fixture.create_text_file("app.py", "import sys\n");

    fixture.organize(OrganizeMode::Auto, false);
    let after_first = fixture.snapshot();

    let second = fixture.organize(OrganizeMode::Auto, false);
    assert_eq!(second.moved_count(), 0);
    assert_eq!(fixture.snapshot(), after_first);

    let recursive = fixture.organize_with(OrganizeMode::Auto, false, true, "");
    assert_eq!(recursive.files.len(), 4);
    assert_eq!(recursive.moved_count(), 0);
    assert!(recursive
        .files
        .iter()
        .all(|file| matches!(file.outcome, FileOutcome::AlreadyOrganized { .. })));
    assert_eq!(fixture.snapshot(), after_first);
}

// ============================================================================
// Test Suite 4: Journal and Undo
// ============================================================================

#[test]
fn test_journal_block_structure() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");
    fixture.create_text_file("b.txt", "beta");

    let report = fixture.organize(OrganizeMode::Auto, false);
    let entries = fixture.journal_entries();

    assert_eq!(entries.len(), 4);
    let JournalEntry::Header(header) = &entries[0] else {
        panic!("first entry should be a header");
    };
    assert_eq!(header.run_id, report.run_id);
    assert_eq!(header.mode, OrganizeMode::Auto);
    assert_eq!(header.planned_files, 2);
    for entry in &entries[1..3] {
        let JournalEntry::Move(record) = entry else {
            panic!("expected move records");
        };
        assert_eq!(record.category, "documents");
        assert!(record.confidence.is_some());
    }
    let JournalEntry::Footer(footer) = &entries[3] else {
        panic!("last entry should be a footer");
    };
    assert_eq!(footer.file_count, 2);
}

#[test]
fn test_rule_only_modes_omit_confidence() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");

    fixture.organize(OrganizeMode::Type, false);

    let record = fixture
        .journal_entries()
        .into_iter()
        .find_map(|entry| match entry {
            JournalEntry::Move(record) => Some(record),
            _ => None,
        })
        .expect("move record");
    assert_eq!(record.confidence, None);
}

#[test]
fn test_undo_is_left_inverse() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report_final.txt", "Final numbers\n");
    fixture.create_file("logo.png", &png_bytes(128, 128));
    fixture.create_text_file("app.py", "import sys\n");
    fixture.create_text_file("documents/general/notes.txt", "older notes");
    fixture.create_text_file("notes.txt", "newer notes");
    let before = fixture.snapshot();

    fixture.organize(OrganizeMode::Auto, false);
    assert_ne!(fixture.snapshot(), before);

    let report = UndoManager::undo(fixture.path()).expect("Undo failed");
    assert_eq!(report.restored, 4);
    assert!(report.is_complete_success());
    assert_eq!(fixture.snapshot(), before);
    // Only the pre-existing documents/ tree remains.
    assert_eq!(fixture.count_dirs(), 1);
}

#[test]
fn test_repeated_undo_walks_back_through_runs() {
    let fixture = TestFixture::new();
    fixture.create_text_file("first.txt", "first");
    fixture.organize(OrganizeMode::Auto, false);
    fixture.create_text_file("second.txt", "second");
    fixture.organize(OrganizeMode::Auto, false);

    UndoManager::undo(fixture.path()).expect("First undo failed");
    fixture.assert_file_exists("second.txt");
    fixture.assert_file_exists("documents/general/first.txt");

    UndoManager::undo(fixture.path()).expect("Second undo failed");
    fixture.assert_file_exists("first.txt");

    assert!(matches!(
        UndoManager::undo(fixture.path()),
        Err(OrganizeError::NothingToUndo { .. })
    ));
}

#[test]
fn test_undo_with_modified_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");
    fixture.create_text_file("b.txt", "beta");
    fixture.organize(OrganizeMode::Auto, false);

    fs::remove_file(fixture.path().join("documents/general/a.txt")).unwrap();
    fixture.create_text_file("b.txt", "someone else");

    let report = UndoManager::undo(fixture.path()).expect("Undo failed");
    assert_eq!(report.restored, 0);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(
        fs::read_to_string(fixture.path().join("b.txt")).unwrap(),
        "someone else"
    );
    fixture.assert_file_exists("documents/general/b.txt");
}

#[test]
fn test_undo_keeps_preexisting_empty_directory() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join("documents/final")).unwrap();
    fixture.create_text_file("report_final.txt", "Final numbers\n");

    fixture.organize(OrganizeMode::Auto, false);
    fixture.assert_file_exists("documents/final/report_final.txt");

    let report = UndoManager::undo(fixture.path()).expect("Undo failed");
    assert_eq!(report.restored, 1);
    assert_eq!(report.removed_dirs, 0);
    fixture.assert_file_exists("report_final.txt");
    assert!(fixture.path().join("documents/final").is_dir());
}

#[test]
fn test_failed_restore_keeps_run_undoable() {
    let fixture = TestFixture::new();
    fixture.create_text_file("sub/a.txt", "alpha");

    fixture.organize_with(OrganizeMode::Auto, false, true, "");
    fixture.assert_file_exists("documents/general/a.txt");

    // A regular file now sits where the original parent directory was.
    fs::remove_dir(fixture.path().join("sub")).unwrap();
    fixture.create_text_file("sub", "in the way");

    let report = UndoManager::undo(fixture.path()).expect("Undo failed");
    assert_eq!(report.restored, 0);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_complete_success());
    assert!(!fixture
        .journal_entries()
        .iter()
        .any(|entry| matches!(entry, JournalEntry::Undone(_))));
    fixture.assert_file_exists("documents/general/a.txt");

    let cli_result = run_cli(OrganizeCommand::Undo, fixture.path(), &fixture.settings(""));
    assert!(cli_result.is_err());

    // Once the obstacle is gone the same run can still be undone.
    fs::remove_file(fixture.path().join("sub")).unwrap();
    let report = UndoManager::undo(fixture.path()).expect("Undo failed");
    assert_eq!(report.restored, 1);
    fixture.assert_file_exists("sub/a.txt");
    assert!(fixture
        .journal_entries()
        .iter()
        .any(|entry| matches!(entry, JournalEntry::Undone(_))));
}

#[test]
fn test_cli_undo_without_history() {
    let fixture = TestFixture::new();
    let result = run_cli(OrganizeCommand::Undo, fixture.path(), &fixture.settings(""));
    assert!(result.is_err());
}

// ============================================================================
// Test Suite 5: Alternative Modes
// ============================================================================

#[test]
fn test_type_mode() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", &png_bytes(10, 10));
    fixture.create_file("report.pdf", PDF_HEADER);
    fixture.create_file("bundle.zip", ZIP_HEADER);
    fixture.create_file("song.mp3", MP3_HEADER);

    fixture.organize(OrganizeMode::Type, false);

    fixture.assert_file_exists("images/photo.png");
    fixture.assert_file_exists("documents/report.pdf");
    fixture.assert_file_exists("archives/bundle.zip");
    fixture.assert_file_exists("audio/song.mp3");
}

#[test]
fn test_date_mode() {
    let fixture = TestFixture::new();
    fixture.create_text_file("old.txt", "from 2023");
    let may_2023 = Local.with_ymd_and_hms(2023, 5, 10, 12, 0, 0).unwrap();
    fixture.set_modified("old.txt", SystemTime::from(may_2023));

    let report = fixture.organize(OrganizeMode::Date, false);

    fixture.assert_file_exists("2023/2023-05/old.txt");
    assert_eq!(report.category_counts().get("2023"), Some(&1));
}

#[test]
fn test_size_mode() {
    let fixture = TestFixture::new();
    fixture.create_text_file("small.txt", "tiny");
    fixture.create_file("bigger.bin", &vec![7u8; 4096]);

    fixture.organize(OrganizeMode::Size, false);

    fixture.assert_file_exists("tiny/small.txt");
    fixture.assert_file_exists("small/bigger.bin");
}

#[test]
fn test_project_mode() {
    let fixture = TestFixture::new();
    fixture.create_text_file("main.rs", "fn main() {}\n");
    fixture.create_text_file("test_api.py", "import unittest\n");
    fixture.create_text_file("README.md", "# Tool\n");
    fixture.create_text_file("build.sh", "#!/bin/sh\necho build\n");
    fixture.create_text_file("settings.toml", "debug = true\n");
    fixture.create_file("logo.png", &png_bytes(32, 32));

    fixture.organize(OrganizeMode::Project, false);

    fixture.assert_file_exists("src/main.rs");
    fixture.assert_file_exists("tests/test_api.py");
    fixture.assert_file_exists("docs/README.md");
    fixture.assert_file_exists("scripts/build.sh");
    fixture.assert_file_exists("config/settings.toml");
    fixture.assert_file_exists("assets/logo.png");
}

// ============================================================================
// Test Suite 6: Configuration and Filtering
// ============================================================================

#[test]
fn test_custom_rules_take_priority() {
    let fixture = TestFixture::new();
    fixture.create_text_file("mockup.psd", "8BPS layered design");
    fixture.create_text_file("script.py", "import os\n");

    let report = fixture.organize_with(
        OrganizeMode::Auto,
        false,
        false,
        r#"
[[rules]]
pattern = "*.psd"
category = "images"
subcategory = "design"
confidence = 97

[[rules]]
pattern = "script.*"
category = "code"
subcategory = "tools"
"#,
    );

    fixture.assert_file_exists("images/design/mockup.psd");
    fixture.assert_file_exists("code/tools/script.py");
    let psd = report
        .files
        .iter()
        .find(|file| file.path.ends_with("mockup.psd"))
        .unwrap();
    assert!(psd.classification.rationale.contains("*.psd"));
}

#[test]
fn test_organize_with_exclude_filters() {
    let fixture = TestFixture::new();
    fixture.create_text_file("keep.txt", "keep");
    fixture.create_text_file("scratch.tmp", "temporary file");
    fixture.create_text_file("debug.log", "Debug output");

    fixture.organize_with(
        OrganizeMode::Auto,
        false,
        false,
        r#"
[filters.exclude]
patterns = ["*.tmp"]
extensions = ["log"]
"#,
    );

    fixture.assert_file_exists("documents/general/keep.txt");
    fixture.assert_file_exists("scratch.tmp");
    fixture.assert_file_exists("debug.log");
}

#[test]
fn test_hidden_files_excluded_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".hidden.txt", "secret");
    fixture.create_text_file("visible.txt", "public");

    fixture.organize(OrganizeMode::Auto, false);

    fixture.assert_file_exists(".hidden.txt");
    fixture.assert_file_exists("documents/general/visible.txt");
}

#[test]
fn test_cli_rejects_invalid_config() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");

    let result = run_cli(
        OrganizeCommand::Organize {
            mode: OrganizeMode::Auto,
            recursive: false,
            dry_run: false,
        },
        fixture.path(),
        &fixture.settings("[[rules]]\npattern = \"[oops\"\ncategory = \"data\"\n"),
    );

    assert!(result.is_err());
    fixture.assert_file_exists("a.txt");
}

// ============================================================================
// Test Suite 7: Edge Cases and Error Scenarios
// ============================================================================

#[test]
fn test_invalid_directory() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("does-not-exist");

    let result = run_cli(
        OrganizeCommand::Organize {
            mode: OrganizeMode::Auto,
            recursive: false,
            dry_run: true,
        },
        &missing,
        &fixture.settings(""),
    );

    assert!(result.unwrap_err().contains("Invalid directory"));
}

#[test]
fn test_move_failure_does_not_stop_the_run() {
    let fixture = TestFixture::new();
    // A regular file where the documents directory would be created.
    fixture.create_text_file("documents", "not a directory");
    fixture.create_text_file("notes.txt", "plain notes");
    fixture.create_text_file("script.py", "import os\n");
    let config = "[filters.exclude]\nfilenames = [\"documents\"]\n";

    let report = fixture.organize_with(OrganizeMode::Auto, false, false, config);

    assert!(report.has_failures());
    assert_eq!(report.failures().count(), 1);
    let FileOutcome::Failed(error) = outcome_for(&report, "notes.txt") else {
        panic!("notes.txt should have failed to move");
    };
    assert!(error.destination.ends_with("documents/general/notes.txt"));
    assert!(matches!(
        outcome_for(&report, "script.py"),
        FileOutcome::Moved { .. }
    ));
    fixture.assert_file_exists("notes.txt");
    fixture.assert_file_exists("code/python/script.py");

    // Only the executed move is journaled.
    let moves = fixture
        .journal_entries()
        .into_iter()
        .filter(|entry| matches!(entry, JournalEntry::Move(_)))
        .count();
    assert_eq!(moves, 1);

    let result = run_cli(
        OrganizeCommand::Organize {
            mode: OrganizeMode::Auto,
            recursive: false,
            dry_run: false,
        },
        fixture.path(),
        &fixture.settings(config),
    );
    assert!(result.unwrap_err().contains("could not be organized"));
    fixture.assert_file_exists("notes.txt");
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    let content = "line one\nline two\nline three\n";
    fixture.create_text_file("letter.txt", content);

    fixture.organize(OrganizeMode::Auto, false);

    assert_eq!(
        fs::read_to_string(fixture.path().join("documents/general/letter.txt")).unwrap(),
        content
    );
}

#[test]
fn test_organize_special_characters_in_filename() {
    let fixture = TestFixture::new();
    fixture.create_text_file("my notes (v2) – ünïcode.txt", "text");

    let report = fixture.organize(OrganizeMode::Type, false);

    assert!(!report.has_failures());
    fixture.assert_file_exists("documents/my notes (v2) – ünïcode.txt");
}

#[test]
fn test_extension_only_sniffer_degrades_gracefully() {
    let fixture = TestFixture::new();
    fixture.create_file("wallpaper.png", &png_bytes(1920, 1080));

    let config = OrganizerConfig::default().compile().unwrap();
    let organizer = Organizer::with_sniffer(
        fixture.path(),
        config,
        ModelStore::at(fixture.model_path()),
        Box::new(dirsmith::inspector::ExtensionOnly),
    )
    .expect("Failed to create organizer");
    organizer.run(&OrganizeOptions::default()).expect("Run failed");

    // Without header decoding the image shape is unknown.
    fixture.assert_file_exists("images/general/wallpaper.png");
}
