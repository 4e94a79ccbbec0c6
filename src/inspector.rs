//! Content inspection: low-level facts about one file.
//!
//! The inspector only reads. It stats the file, pulls at most
//! [`HEAD_BYTES`] of leading bytes, asks a [`ContentSniffer`] for a MIME type
//! and image facts, and keeps a short text sample for text-like files.
//! Anything that fails degrades to "unknown" facts instead of an error.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Maximum number of leading bytes read from any file.
pub const HEAD_BYTES: usize = 64 * 1024;

/// Maximum length of the text sample kept for sniffing.
pub const SAMPLE_BYTES: usize = 10 * 1024;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Coarse size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeClass {
    /// Buckets a byte count: <1 KiB, <100 KiB, <10 MiB, <100 MiB, else huge.
    pub fn from_bytes(size: u64) -> Self {
        if size < KIB {
            SizeClass::Tiny
        } else if size < 100 * KIB {
            SizeClass::Small
        } else if size < 10 * MIB {
            SizeClass::Medium
        } else if size < 100 * MIB {
            SizeClass::Large
        } else {
            SizeClass::Huge
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            SizeClass::Tiny => "tiny",
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
            SizeClass::Huge => "huge",
        }
    }

    pub fn is_big(&self) -> bool {
        matches!(self, SizeClass::Large | SizeClass::Huge)
    }
}

/// Age bucket derived from modification time relative to invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeClass {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    Old,
}

impl AgeClass {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 0 => AgeClass::Today,
            d if d < 7 => AgeClass::ThisWeek,
            d if d < 30 => AgeClass::ThisMonth,
            d if d < 365 => AgeClass::ThisYear,
            _ => AgeClass::Old,
        }
    }
}

/// Dimensions and EXIF tags pulled from an image header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFacts {
    pub dimensions: Option<(u32, u32)>,
    /// `Make` and `Model` joined, when present.
    pub camera: Option<String>,
    /// `Software` tag, when present.
    pub software: Option<String>,
}

/// Best-effort MIME and image metadata detection.
///
/// Implementations must not fail; they return `None` when they cannot tell.
pub trait ContentSniffer: Send + Sync {
    /// Detects a MIME type from leading bytes.
    fn sniff_mime(&self, head: &[u8]) -> Option<String>;

    /// Extracts image dimensions and metadata tags.
    fn image_facts(&self, path: &Path, head: &[u8]) -> Option<ImageFacts>;
}

/// Magic-byte sniffing with `infer`, header decoding with `image`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferSniffer;

impl ContentSniffer for InferSniffer {
    fn sniff_mime(&self, head: &[u8]) -> Option<String> {
        infer::get(head).map(|kind| kind.mime_type().to_string())
    }

    fn image_facts(&self, path: &Path, head: &[u8]) -> Option<ImageFacts> {
        let dimensions = image::ImageReader::open(path)
            .ok()
            .and_then(|reader| reader.with_guessed_format().ok())
            .and_then(|reader| reader.into_dimensions().ok());
        let (camera, software) = parse_exif_tags(head);

        if dimensions.is_none() && camera.is_none() && software.is_none() {
            return None;
        }
        Some(ImageFacts {
            dimensions,
            camera,
            software,
        })
    }
}

/// Degraded sniffer: no content detection, extension lookups only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionOnly;

impl ContentSniffer for ExtensionOnly {
    fn sniff_mime(&self, _head: &[u8]) -> Option<String> {
        None
    }

    fn image_facts(&self, _path: &Path, _head: &[u8]) -> Option<ImageFacts> {
        None
    }
}

/// Everything the inspector learned about one file.
#[derive(Debug, Clone)]
pub struct ContentFacts {
    pub size_bytes: u64,
    pub size_class: SizeClass,
    pub mime: Option<String>,
    pub modified: Option<DateTime<Local>>,
    /// Seconds between modification and invocation time.
    pub age_seconds: Option<i64>,
    pub age_class: AgeClass,
    /// Lossy UTF-8 sample of at most [`SAMPLE_BYTES`], text-like files only.
    pub sample: Option<String>,
    pub image: Option<ImageFacts>,
    /// False when the file could not be stat'ed or read.
    pub readable: bool,
}

impl ContentFacts {
    /// Facts for a file that could not be inspected at all.
    pub fn unknown() -> Self {
        Self {
            size_bytes: 0,
            size_class: SizeClass::Tiny,
            mime: None,
            modified: None,
            age_seconds: None,
            age_class: AgeClass::Old,
            sample: None,
            image: None,
            readable: false,
        }
    }
}

/// Extensions whose content is sampled even when no MIME type says "text".
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "rst", "log", "json", "csv", "tsv", "xml", "yaml", "yml",
    "toml", "ini", "cfg", "conf", "env", "properties", "sql", "html", "htm", "rs", "py", "js",
    "mjs", "ts", "tsx", "jsx", "go", "java", "kt", "c", "h", "cpp", "cc", "hpp", "cs", "rb",
    "php", "swift", "scala", "lua", "pl", "sh", "bash", "zsh", "r", "hs", "ex", "exs", "dart",
];

fn is_text_mime(mime: &str) -> bool {
    mime.starts_with("text/")
        || matches!(
            mime,
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/toml"
                | "application/x-sh"
                | "application/sql"
        )
}

/// Runs content inspection against a fixed invocation time.
pub struct Inspector {
    sniffer: Box<dyn ContentSniffer>,
    now: DateTime<Local>,
}

impl Inspector {
    pub fn new(sniffer: Box<dyn ContentSniffer>, now: DateTime<Local>) -> Self {
        Self { sniffer, now }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    /// Inspects one file. Never fails; unreadable files get [`ContentFacts::unknown`].
    pub fn inspect(&self, path: &Path) -> ContentFacts {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                return ContentFacts::unknown();
            }
        };

        let size_bytes = metadata.len();
        let modified: Option<DateTime<Local>> = metadata.modified().ok().map(DateTime::from);
        let age_seconds = modified.map(|m| (self.now - m).num_seconds().max(0));
        let age_class = age_seconds
            .map(|secs| AgeClass::from_days(secs / 86_400))
            .unwrap_or(AgeClass::Old);

        let mut facts = ContentFacts {
            size_bytes,
            size_class: SizeClass::from_bytes(size_bytes),
            mime: None,
            modified,
            age_seconds,
            age_class,
            sample: None,
            image: None,
            readable: true,
        };

        let head = match read_head(path) {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                facts.readable = false;
                facts.mime = guess_mime(path);
                return facts;
            }
        };

        facts.mime = self.sniffer.sniff_mime(&head).or_else(|| guess_mime(path));

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        let text_like = facts.mime.as_deref().is_some_and(is_text_mime)
            || extension
                .as_deref()
                .is_none_or(|ext| TEXT_EXTENSIONS.contains(&ext));
        if text_like && !head.contains(&0) {
            let end = head.len().min(SAMPLE_BYTES);
            facts.sample = Some(String::from_utf8_lossy(&head[..end]).into_owned());
        }

        if facts
            .mime
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
        {
            facts.image = self.sniffer.image_facts(path, &head);
        }

        facts
    }
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(8 * 1024);
    file.take(HEAD_BYTES as u64).read_to_end(&mut head)?;
    Ok(head)
}

fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_SOFTWARE: u16 = 0x0131;
const TYPE_ASCII: u16 = 2;

/// Pulls camera (`Make` + `Model`) and `Software` tags out of IFD0 of an
/// EXIF block embedded in `head`.
pub fn parse_exif_tags(head: &[u8]) -> (Option<String>, Option<String>) {
    let Some(start) = head.windows(6).position(|w| w == b"Exif\0\0") else {
        return (None, None);
    };
    let tiff = &head[start + 6..];
    if tiff.len() < 8 {
        return (None, None);
    }
    let little = match &tiff[..2] {
        b"II" => true,
        b"MM" => false,
        _ => return (None, None),
    };
    let read_u16 = |at: usize| -> Option<u16> {
        let bytes: [u8; 2] = tiff.get(at..at + 2)?.try_into().ok()?;
        Some(if little {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        })
    };
    let read_u32 = |at: usize| -> Option<u32> {
        let bytes: [u8; 4] = tiff.get(at..at + 4)?.try_into().ok()?;
        Some(if little {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    };
    if read_u16(2) != Some(42) {
        return (None, None);
    }

    let Some(ifd) = read_u32(4).map(|offset| offset as usize) else {
        return (None, None);
    };
    let entries = read_u16(ifd).unwrap_or(0) as usize;

    let (mut make, mut model, mut software) = (None, None, None);
    for i in 0..entries {
        let entry = ifd + 2 + i * 12;
        let (Some(tag), Some(kind), Some(count)) =
            (read_u16(entry), read_u16(entry + 2), read_u32(entry + 4))
        else {
            break;
        };
        if kind != TYPE_ASCII || !matches!(tag, TAG_MAKE | TAG_MODEL | TAG_SOFTWARE) {
            continue;
        }
        let count = count as usize;
        let value_at = if count <= 4 {
            entry + 8
        } else {
            match read_u32(entry + 8) {
                Some(offset) => offset as usize,
                None => continue,
            }
        };
        let Some(raw) = tiff.get(value_at..value_at + count) else {
            continue;
        };
        let text = String::from_utf8_lossy(raw)
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        if text.is_empty() {
            continue;
        }
        match tag {
            TAG_MAKE => make = Some(text),
            TAG_MODEL => model = Some(text),
            _ => software = Some(text),
        }
    }

    let camera = match (make, model) {
        (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        (make, model) => make.or(model),
    };
    (camera, software)
}
