//! Feature extraction: one immutable [`FeatureSet`] per file.
//!
//! Combines inspector output with filename patterns and the parent directory
//! name. Pure: the same path and facts always produce the same features.

use crate::file_category::DATA_EXTENSIONS;
use crate::inspector::{AgeClass, ContentFacts, SizeClass};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Filename pattern, first match in declaration order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePattern {
    Screenshot,
    Backup,
    Temporary,
    Test,
    Config,
    Documentation,
    Legal,
    Dated,
    Versioned,
    Draft,
    Final,
    None,
}

static NAME_PATTERNS: LazyLock<Vec<(NamePattern, Regex)>> = LazyLock::new(|| {
    [
        (
            NamePattern::Screenshot,
            r"screenshot|screen[ _-]?shot|screen[ _-]?capture|^scr[_-]|^capture|^snip",
        ),
        (
            NamePattern::Backup,
            r"\.bak$|\.backup$|\.old$|~$|(^|[_\-. ])backup([_\-. ]|$)|[_\-]bak([_\-.]|$)|\(copy\)",
        ),
        (
            NamePattern::Temporary,
            r"^~\$|\.tmp$|\.temp$|\.swp$|\.swo$|\.part$|\.crdownload$|^tmp[_\-.]|(^|[_\-.])temp([_\-.]|$)",
        ),
        (
            NamePattern::Test,
            r"^tests?[_\-.]|[_\-.]tests?\.|\.spec\.|_spec\.|^spec[_\-.]",
        ),
        (
            NamePattern::Config,
            r"^config([_\-.]|$)|^settings([_\-.]|$)|^configuration|^\.env|[_\-.]config\.|^\.[a-z0-9_\-]+rc$",
        ),
        (
            NamePattern::Documentation,
            r"^readme|^changelog|^contributing|^authors|^docs?([_\-.]|$)|manual|guide|tutorial|howto|handbook|documentation",
        ),
        (
            NamePattern::Legal,
            r"licen[cs]e|^copying|contract|agreement|terms|privacy|(^|[_\-. ])nda([_\-. ]|$)",
        ),
        (
            NamePattern::Dated,
            r"(19|20)\d{2}[-_.]?(0[1-9]|1[0-2])[-_.]?(0[1-9]|[12]\d|3[01])",
        ),
        (
            NamePattern::Versioned,
            r"(^|[_\-. ])v\d+(\.\d+)*([_\-. ]|$)|version",
        ),
        (NamePattern::Draft, r"draft|(^|[_\-. ])wip([_\-. ]|$)"),
        (NamePattern::Final, r"final"),
    ]
    .into_iter()
    .map(|(pattern, source)| (pattern, Regex::new(source).expect("valid name pattern")))
    .collect()
});

impl NamePattern {
    /// Matches a file name against the ordered pattern list.
    ///
    /// ```
    /// use dirsmith::features::NamePattern;
    ///
    /// assert_eq!(NamePattern::detect("report_final.txt"), NamePattern::Final);
    /// assert_eq!(NamePattern::detect("IMG_2031.jpg"), NamePattern::None);
    /// ```
    pub fn detect(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        NAME_PATTERNS
            .iter()
            .find(|(_, regex)| regex.is_match(&lower))
            .map(|(pattern, _)| *pattern)
            .unwrap_or(NamePattern::None)
    }
}

/// Semantics of the parent directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryContext {
    Downloads,
    Desktop,
    Documents,
    Pictures,
    Videos,
    Music,
    Project,
    Work,
    None,
}

impl DirectoryContext {
    pub fn from_dir_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "downloads" | "download" => DirectoryContext::Downloads,
            "desktop" => DirectoryContext::Desktop,
            "documents" | "my documents" | "docs" => DirectoryContext::Documents,
            "pictures" | "photos" | "images" => DirectoryContext::Pictures,
            "videos" | "movies" => DirectoryContext::Videos,
            "music" | "audio" => DirectoryContext::Music,
            "src" | "lib" | "project" | "projects" | "repo" | "repos" | "code" | "dev"
            | "workspace" => DirectoryContext::Project,
            "work" | "office" | "job" | "clients" | "business" => DirectoryContext::Work,
            other if other.contains("project") => DirectoryContext::Project,
            other if other.contains("work") => DirectoryContext::Work,
            _ => DirectoryContext::None,
        }
    }
}

/// Aspect class of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageShape {
    Thumbnail,
    Wide,
    Portrait,
    Standard,
}

impl ImageShape {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width <= 256 && height <= 256 {
            ImageShape::Thumbnail
        } else if height > 0 && width as f64 / height as f64 >= 1.7 {
            ImageShape::Wide
        } else if height > width {
            ImageShape::Portrait
        } else {
            ImageShape::Standard
        }
    }
}

/// What the text sample looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentHint {
    Markdown,
    Config,
    Json,
    Xml,
    Csv,
    Plain,
    Binary,
    Unknown,
}

impl ContentHint {
    pub fn is_data(&self) -> bool {
        matches!(self, ContentHint::Json | ContentHint::Xml | ContentHint::Csv)
    }

    /// Data subtype name for data hints.
    pub fn data_kind(&self) -> Option<&'static str> {
        match self {
            ContentHint::Json => Some("json"),
            ContentHint::Xml => Some("xml"),
            ContentHint::Csv => Some("csv"),
            _ => None,
        }
    }
}

/// Source-language table: extension, language, signature snippets.
const LANGUAGES: &[(&[&str], &str, &[&str])] = &[
    (&["rs"], "rust", &["fn ", "use ", "impl ", "let mut "]),
    (&["py"], "python", &["def ", "import ", "class ", "print("]),
    (
        &["js", "mjs", "jsx"],
        "javascript",
        &["function", "const ", "=>", "require("],
    ),
    (&["ts", "tsx"], "typescript", &["interface ", ": string", "export ", "import "]),
    (&["go"], "go", &["package ", "func "]),
    (&["java"], "java", &["public class", "import java", "package "]),
    (&["kt"], "kotlin", &["fun ", "val "]),
    (&["c", "h"], "c", &["#include", "int main"]),
    (&["cpp", "cc", "hpp"], "cpp", &["#include", "std::", "namespace "]),
    (&["cs"], "csharp", &["using System", "namespace "]),
    (&["rb"], "ruby", &["def ", "require ", "end\n"]),
    (&["php"], "php", &["<?php"]),
    (&["swift"], "swift", &["func ", "import Foundation"]),
    (&["scala"], "scala", &["object ", "def "]),
    (&["lua"], "lua", &["local ", "function "]),
    (&["pl"], "perl", &["use strict", "my $"]),
    (&["sh", "bash", "zsh"], "shell", &["#!/", "echo ", "export "]),
    (&["r"], "r", &["<- ", "library("]),
    (&["hs"], "haskell", &["module ", "where", "::"]),
    (&["ex", "exs"], "elixir", &["defmodule ", "def "]),
    (&["dart"], "dart", &["void main", "import 'package:"]),
];

/// Languages recognized from a `#!` line on extensionless files.
const SHEBANGS: &[(&str, &str)] = &[
    ("python", "python"),
    ("node", "javascript"),
    ("ruby", "ruby"),
    ("perl", "perl"),
    ("bash", "shell"),
    ("zsh", "shell"),
    ("/sh", "shell"),
];

/// Extensions that hold source code in a recognized language.
pub fn is_source_extension(ext: &str) -> bool {
    LANGUAGES.iter().any(|(exts, _, _)| exts.contains(&ext))
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    match lower.as_str() {
        "jpeg" => "jpg".to_string(),
        "yml" => "yaml".to_string(),
        "htm" => "html".to_string(),
        "tif" => "tiff".to_string(),
        "markdown" => "md".to_string(),
        _ => lower,
    }
}

static CONFIG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_.\-]+\s*=|\[[A-Za-z0-9_. \-]+\]\s*$)").expect("valid config regex")
});

const CONFIG_EXTENSIONS: &[&str] = &["ini", "cfg", "conf", "toml", "env", "properties"];

/// Immutable per-file feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub file_name: String,
    /// Lowercased, normalized extension.
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub size_class: SizeClass,
    pub mime_category: Option<String>,
    pub mime_subtype: Option<String>,
    pub name_pattern: NamePattern,
    pub age_class: AgeClass,
    pub directory_context: DirectoryContext,
    pub language: Option<String>,
    /// The sample contains a signature of `language`.
    pub language_confirmed: bool,
    pub image_shape: Option<ImageShape>,
    pub content_hint: ContentHint,
    pub camera: Option<String>,
    pub software: Option<String>,
    pub dotfile: bool,
    /// Modified within the last hour.
    pub recently_modified: bool,
    pub readable: bool,
}

impl FeatureSet {
    /// Full MIME string, when known.
    pub fn mime(&self) -> Option<String> {
        match (&self.mime_category, &self.mime_subtype) {
            (Some(category), Some(subtype)) => Some(format!("{}/{}", category, subtype)),
            _ => None,
        }
    }

    pub fn mime_is(&self, category: &str) -> bool {
        self.mime_category.as_deref() == Some(category)
    }

    pub fn extension_in(&self, list: &[&str]) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| list.contains(&ext))
    }
}

/// Builds the feature set for `path` from its inspected facts.
pub fn extract(path: &Path, facts: &ContentFacts) -> FeatureSet {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| normalize_extension(&ext.to_string_lossy()));
    let directory_context = path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| DirectoryContext::from_dir_name(&name.to_string_lossy()))
        .unwrap_or(DirectoryContext::None);

    let (mime_category, mime_subtype) = match facts.mime.as_deref().and_then(|m| m.split_once('/'))
    {
        Some((category, subtype)) => (Some(category.to_string()), Some(subtype.to_string())),
        None => (None, None),
    };

    let sample = facts.sample.as_deref();
    let (language, language_confirmed) = detect_language(extension.as_deref(), sample);
    let content_hint = detect_content_hint(
        extension.as_deref(),
        language.is_some(),
        sample,
        facts,
    );

    let image = facts.image.as_ref();
    let image_shape = image
        .and_then(|image| image.dimensions)
        .map(|(width, height)| ImageShape::from_dimensions(width, height));

    FeatureSet {
        name_pattern: NamePattern::detect(&file_name),
        dotfile: file_name.starts_with('.'),
        file_name,
        extension,
        size_bytes: facts.size_bytes,
        size_class: facts.size_class,
        mime_category,
        mime_subtype,
        age_class: facts.age_class,
        directory_context,
        language,
        language_confirmed,
        image_shape,
        content_hint,
        camera: image.and_then(|image| image.camera.clone()),
        software: image.and_then(|image| image.software.clone()),
        recently_modified: facts.age_seconds.is_some_and(|secs| secs < 3600),
        readable: facts.readable,
    }
}

fn detect_language(extension: Option<&str>, sample: Option<&str>) -> (Option<String>, bool) {
    match extension {
        Some(ext) => {
            let Some((_, language, signatures)) =
                LANGUAGES.iter().find(|(exts, _, _)| exts.contains(&ext))
            else {
                return (None, false);
            };
            let confirmed =
                sample.is_some_and(|text| signatures.iter().any(|sig| text.contains(sig)));
            (Some(language.to_string()), confirmed)
        }
        None => {
            let Some(first_line) = sample.and_then(|text| text.lines().next()) else {
                return (None, false);
            };
            if !first_line.starts_with("#!") {
                return (None, false);
            }
            SHEBANGS
                .iter()
                .find(|(needle, _)| first_line.contains(needle))
                .map(|(_, language)| (Some(language.to_string()), true))
                .unwrap_or((None, false))
        }
    }
}

fn detect_content_hint(
    extension: Option<&str>,
    has_language: bool,
    sample: Option<&str>,
    facts: &ContentFacts,
) -> ContentHint {
    let Some(text) = sample else {
        return if facts.readable && facts.mime.is_some() {
            ContentHint::Binary
        } else {
            ContentHint::Unknown
        };
    };
    if has_language {
        return ContentHint::Plain;
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let plain_text = matches!(extension, None | Some("txt") | Some("text"));
    if extension == Some("md")
        || (plain_text && lines.first().is_some_and(|line| line.starts_with("# ")))
    {
        return ContentHint::Markdown;
    }

    let is_data_ext = extension.is_some_and(|ext| DATA_EXTENSIONS.contains(&ext));
    if !is_data_ext {
        let content_lines: Vec<&&str> = lines
            .iter()
            .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
            .collect();
        let config_lines = content_lines
            .iter()
            .filter(|line| CONFIG_LINE.is_match(line))
            .count();
        let config_ext = extension.is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext));
        let enough = if config_ext { 1 } else { 2 };
        if config_lines >= enough && config_lines * 2 >= content_lines.len() {
            return ContentHint::Config;
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with("<?xml") {
        return ContentHint::Xml;
    }
    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        return ContentHint::Json;
    }
    if looks_like_csv(&lines) {
        return ContentHint::Csv;
    }
    ContentHint::Plain
}

fn looks_like_csv(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let head: Vec<usize> = lines
        .iter()
        .take(5)
        .map(|line| line.matches(',').count())
        .collect();
    head[0] > 0 && head.iter().all(|count| *count == head[0])
}
