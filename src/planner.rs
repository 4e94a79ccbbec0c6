//! Destination planning: hierarchy table and collision policy.
//!
//! The planner never touches file contents except to compare a source with an
//! occupant of its destination. Every destination it hands out is reserved for
//! the rest of the run, so a preview and a real run plan the same paths.

use crate::features::{FeatureSet, NamePattern};
use crate::file_category::Category;
use crate::inspector::AgeClass;
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// (category, subcategory) → directory under the organizing root.
const HIERARCHY: &[(Category, &str, &str)] = &[
    (Category::Documents, "docs", "documents/documentation"),
    (Category::Documents, "legal", "documents/legal"),
    (Category::Documents, "drafts", "documents/drafts"),
    (Category::Documents, "final", "documents/final"),
    (Category::Documents, "work", "documents/work"),
    (Category::Images, "screenshots", "images/screenshots"),
    (Category::Images, "photos", "images/photos"),
    (Category::Images, "edited", "images/edited"),
    (Category::Images, "thumbnails", "images/thumbnails"),
    (Category::Images, "wallpapers", "images/wallpapers"),
    (Category::Audio, "clips", "audio/clips"),
    (Category::Audio, "full", "audio/full"),
    (Category::Videos, "clips", "videos/clips"),
    (Category::Videos, "full", "videos/full"),
    (Category::Archives, "backups", "archives/backups"),
    (Category::System, "temp", "system/temp"),
    (Category::System, "backups", "system/backups"),
    (Category::Misc, "downloads", "misc/downloads"),
    (Category::Code, "project", "code/project"),
];

/// Relative destination directory for a classification.
///
/// Subcategories missing from the table (source languages, data kinds and
/// custom-rule subcategories) become `<category>/<subcategory>` when they are
/// a plain single path segment; anything else lands in `<category>/general`.
///
/// ```
/// use dirsmith::file_category::Category;
/// use dirsmith::planner::destination_dir;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     destination_dir(Category::Documents, Some("docs")),
///     PathBuf::from("documents/documentation")
/// );
/// assert_eq!(destination_dir(Category::Code, Some("rust")), PathBuf::from("code/rust"));
/// assert_eq!(destination_dir(Category::Misc, None), PathBuf::from("misc/general"));
/// ```
pub fn destination_dir(category: Category, subcategory: Option<&str>) -> PathBuf {
    let Some(sub) = subcategory else {
        return Path::new(category.dir_name()).join("general");
    };
    if let Some((_, _, dir)) = HIERARCHY
        .iter()
        .find(|(cat, name, _)| *cat == category && *name == sub)
    {
        return PathBuf::from(dir);
    }

    let is_segment = !sub.is_empty()
        && sub != "."
        && sub != ".."
        && !sub.contains(['/', '\\']);
    if is_segment {
        Path::new(category.dir_name()).join(sub.to_lowercase())
    } else {
        Path::new(category.dir_name()).join("general")
    }
}

/// Where a file should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Move { destination: PathBuf },
    /// The file is already in place, or an identical copy occupies its slot.
    AlreadyOrganized { existing: PathBuf },
}

/// Plans collision-free destinations for one run.
#[derive(Debug)]
pub struct PathPlanner {
    root: PathBuf,
    now: DateTime<Local>,
    /// Planned destination → planned source.
    reserved: HashMap<PathBuf, PathBuf>,
    /// Sources that will have moved away by the time later files land.
    vacated: HashSet<PathBuf>,
}

impl PathPlanner {
    pub fn new(root: impl Into<PathBuf>, now: DateTime<Local>) -> Self {
        Self {
            root: root.into(),
            now,
            reserved: HashMap::new(),
            vacated: HashSet::new(),
        }
    }

    /// Picks the destination for `source` inside `relative_dir`.
    ///
    /// `modified` stamps the time suffix for files touched today; the
    /// planner's clock is used when it is unknown.
    pub fn plan(
        &mut self,
        source: &Path,
        relative_dir: &Path,
        features: &FeatureSet,
        modified: Option<DateTime<Local>>,
    ) -> io::Result<Placement> {
        let file_name = source.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "file has no name component")
        })?;
        let dir = self.root.join(relative_dir);
        let direct = dir.join(file_name);

        if direct == source {
            return Ok(Placement::AlreadyOrganized { existing: direct });
        }
        if self.is_taken(&direct) {
            if self.occupant_identical(&direct, source)? {
                return Ok(Placement::AlreadyOrganized { existing: direct });
            }
        } else {
            return Ok(self.reserve(source, direct));
        }

        let file_path = Path::new(file_name);
        let stem = file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = file_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string());

        let base = if features.age_class == AgeClass::Today {
            let stamp = modified.unwrap_or(self.now).format("%H%M%S");
            format!("{}_{}", stem, stamp)
        } else {
            match features.name_pattern {
                NamePattern::Backup => format!("{}_backup", stem),
                NamePattern::Draft => format!("{}_draft", stem),
                _ => stem,
            }
        };

        let candidate = dir.join(with_extension(&base, ext.as_deref()));
        if candidate != direct && !self.is_taken(&candidate) {
            return Ok(self.reserve(source, candidate));
        }

        let mut n = 1u32;
        loop {
            let candidate = dir.join(with_extension(&format!("{}_{}", base, n), ext.as_deref()));
            if !self.is_taken(&candidate) {
                return Ok(self.reserve(source, candidate));
            }
            n += 1;
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.reserved.contains_key(path) || self.vacated.contains(path) || path.exists()
    }

    /// Compares `source` with whatever occupies (or will occupy) `slot`.
    fn occupant_identical(&self, slot: &Path, source: &Path) -> io::Result<bool> {
        let occupant = match self.reserved.get(slot) {
            Some(planned) if planned.exists() => planned.as_path(),
            Some(_) => slot,
            None if self.vacated.contains(slot) => return Ok(false),
            None => slot,
        };
        if !occupant.is_file() {
            return Ok(false);
        }
        files_identical(occupant, source)
    }

    fn reserve(&mut self, source: &Path, destination: PathBuf) -> Placement {
        self.reserved
            .insert(destination.clone(), source.to_path_buf());
        self.vacated.insert(source.to_path_buf());
        Placement::Move { destination }
    }
}

fn with_extension(stem: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

/// Byte-for-byte comparison of two files.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    if a.metadata()?.len() != b.metadata()?.len() {
        return Ok(false);
    }

    let mut left = BufReader::new(File::open(a)?);
    let mut right = BufReader::new(File::open(b)?);
    let mut left_buf = [0u8; 8192];
    let mut right_buf = [0u8; 8192];
    loop {
        let read = left.read(&mut left_buf)?;
        if read == 0 {
            return Ok(true);
        }
        right.read_exact(&mut right_buf[..read])?;
        if left_buf[..read] != right_buf[..read] {
            return Ok(false);
        }
    }
}
