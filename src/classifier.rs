//! Rule classifier: an ordered, first-match decision table.
//!
//! Rules model priority, not independent evidence. Reordering the table
//! changes results, so new rules go where their priority belongs rather than
//! at the end.

use crate::config::CompiledRule;
use crate::context::clamp_confidence;
use crate::features::{ContentHint, DirectoryContext, FeatureSet, ImageShape, NamePattern};
use crate::file_category::{ARCHIVE_EXTENSIONS, Category, DATA_EXTENSIONS};
use crate::inspector::SizeClass;
use crate::model::ConfidenceModel;
use serde::{Deserialize, Serialize};

/// Which stage produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Rule,
    Ensemble,
}

/// Category, refinement and confidence for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub subcategory: Option<String>,
    /// Always within [1, 99].
    pub confidence: u8,
    pub rationale: String,
    pub source: ClassificationSource,
}

/// What a matching rule yields before the model adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: Category,
    pub subcategory: Option<String>,
    pub confidence: u8,
    pub rationale: String,
}

impl Verdict {
    fn new(category: Category, subcategory: Option<&str>, confidence: u8, rationale: String) -> Self {
        Self {
            category,
            subcategory: subcategory.map(str::to_string),
            confidence,
            rationale,
        }
    }
}

/// A named predicate → verdict rule.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&FeatureSet) -> Option<Verdict>,
}

/// The built-in table, in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "source-code",
        apply: source_code_rule,
    },
    Rule {
        name: "document",
        apply: document_rule,
    },
    Rule {
        name: "image",
        apply: image_rule,
    },
    Rule {
        name: "media",
        apply: media_rule,
    },
    Rule {
        name: "archive",
        apply: archive_rule,
    },
    Rule {
        name: "config",
        apply: config_rule,
    },
    Rule {
        name: "data",
        apply: data_rule,
    },
    Rule {
        name: "system",
        apply: system_rule,
    },
    Rule {
        name: "directory-context",
        apply: directory_context_rule,
    },
];

const DOCUMENT_MIMES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/rtf",
    "text/rtf",
    "text/markdown",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/epub+zip",
];

const PLAIN_DOCUMENT_EXTENSIONS: &[&str] = &["txt", "text", "log"];

const IMAGE_EDITORS: &[&str] = &[
    "photoshop",
    "gimp",
    "lightroom",
    "snapseed",
    "pixelmator",
    "affinity",
    "darktable",
    "capture one",
];

fn source_code_rule(features: &FeatureSet) -> Option<Verdict> {
    let language = features.language.as_deref()?;
    let (confidence, detail) = if features.language_confirmed {
        (95, "extension and content")
    } else {
        (90, "extension")
    };
    Some(Verdict::new(
        Category::Code,
        Some(language),
        confidence,
        format!("{} source recognized by {}", language, detail),
    ))
}

fn document_rule(features: &FeatureSet) -> Option<Verdict> {
    let mime = features.mime();
    let is_document = mime
        .as_deref()
        .is_some_and(|mime| DOCUMENT_MIMES.contains(&mime))
        || (mime.as_deref() == Some("text/plain")
            && features.extension_in(PLAIN_DOCUMENT_EXTENSIONS))
        || features.content_hint == ContentHint::Markdown;
    if !is_document {
        return None;
    }

    let subcategory = match features.name_pattern {
        NamePattern::Documentation => Some("docs"),
        NamePattern::Legal => Some("legal"),
        NamePattern::Draft => Some("drafts"),
        NamePattern::Final => Some("final"),
        _ => None,
    };
    Some(Verdict::new(
        Category::Documents,
        subcategory,
        90,
        format!(
            "document type {}",
            mime.as_deref().unwrap_or("with markdown structure")
        ),
    ))
}

fn image_rule(features: &FeatureSet) -> Option<Verdict> {
    if !features.mime_is("image") {
        return None;
    }

    let edited_by = features.software.as_deref().filter(|software| {
        let lower = software.to_lowercase();
        IMAGE_EDITORS.iter().any(|editor| lower.contains(editor))
    });

    let (subcategory, confidence, rationale) = if features.name_pattern == NamePattern::Screenshot
    {
        (Some("screenshots"), 98, "screenshot file name".to_string())
    } else if let Some(editor) = edited_by {
        (Some("edited"), 96, format!("edited with {}", editor))
    } else if let Some(camera) = features.camera.as_deref() {
        (Some("photos"), 98, format!("camera tag {}", camera))
    } else {
        match features.image_shape {
            Some(ImageShape::Thumbnail) => (Some("thumbnails"), 95, "thumbnail size".to_string()),
            Some(ImageShape::Wide) => (Some("wallpapers"), 95, "wide aspect ratio".to_string()),
            _ => (None, 95, "image content".to_string()),
        }
    };
    Some(Verdict::new(Category::Images, subcategory, confidence, rationale))
}

fn media_rule(features: &FeatureSet) -> Option<Verdict> {
    let (category, clip_limit) = if features.mime_is("audio") {
        (Category::Audio, SizeClass::Small)
    } else if features.mime_is("video") {
        (Category::Videos, SizeClass::Medium)
    } else {
        return None;
    };
    let subcategory = if features.size_class <= clip_limit {
        "clips"
    } else {
        "full"
    };
    Some(Verdict::new(
        category,
        Some(subcategory),
        95,
        format!("{} content, {:?} size", category, features.size_class).to_lowercase(),
    ))
}

fn archive_rule(features: &FeatureSet) -> Option<Verdict> {
    if !features.extension_in(ARCHIVE_EXTENSIONS) {
        return None;
    }
    let ext = features.extension.as_deref().unwrap_or_default();
    Some(if features.name_pattern == NamePattern::Backup {
        Verdict::new(
            Category::Archives,
            Some("backups"),
            98,
            format!("{} archive named as a backup", ext),
        )
    } else {
        Verdict::new(Category::Archives, None, 95, format!("{} archive", ext))
    })
}

fn config_rule(features: &FeatureSet) -> Option<Verdict> {
    let rationale = if features.content_hint == ContentHint::Config {
        "key/value configuration content"
    } else if features.name_pattern == NamePattern::Config {
        "configuration file name"
    } else {
        return None;
    };
    Some(Verdict::new(
        Category::Config,
        None,
        90,
        rationale.to_string(),
    ))
}

fn data_rule(features: &FeatureSet) -> Option<Verdict> {
    let subcategory = if features.extension_in(DATA_EXTENSIONS) {
        features.extension.as_deref()
    } else {
        features.content_hint.data_kind()
    }?;
    Some(Verdict::new(
        Category::Data,
        Some(subcategory),
        90,
        format!("{} data", subcategory),
    ))
}

fn system_rule(features: &FeatureSet) -> Option<Verdict> {
    let subcategory = match features.name_pattern {
        NamePattern::Temporary => "temp",
        NamePattern::Backup => "backups",
        _ => return None,
    };
    Some(Verdict::new(
        Category::System,
        Some(subcategory),
        95,
        format!("{} file name", subcategory),
    ))
}

fn directory_context_rule(features: &FeatureSet) -> Option<Verdict> {
    let (category, subcategory, confidence) = match features.directory_context {
        DirectoryContext::Downloads => (Category::Misc, "downloads", 70),
        DirectoryContext::Project => (Category::Code, "project", 75),
        DirectoryContext::Work => (Category::Documents, "work", 72),
        _ => return None,
    };
    Some(Verdict::new(
        category,
        Some(subcategory),
        confidence,
        format!("only the parent directory suggests {}", subcategory),
    ))
}

/// Evaluates custom rules, then the built-in table.
pub struct RuleClassifier {
    custom_rules: Vec<CompiledRule>,
}

impl RuleClassifier {
    pub fn new(custom_rules: Vec<CompiledRule>) -> Self {
        Self { custom_rules }
    }

    /// First matching rule wins; nothing matching yields misc at 50.
    pub fn classify(&self, features: &FeatureSet, model: &ConfidenceModel) -> ClassificationResult {
        let verdict = self
            .custom_rules
            .iter()
            .find(|rule| rule.matches(&features.file_name))
            .map(|rule| Verdict {
                category: rule.category,
                subcategory: rule.subcategory.clone(),
                confidence: rule.confidence,
                rationale: format!("custom rule {}", rule.pattern()),
            })
            .or_else(|| RULES.iter().find_map(|rule| (rule.apply)(features)))
            .unwrap_or_else(|| {
                Verdict::new(Category::Misc, None, 50, "no rule matched".to_string())
            });

        let adjusted = verdict.confidence as i16 + model.adjustment(verdict.category);
        ClassificationResult {
            category: verdict.category,
            subcategory: verdict.subcategory,
            confidence: clamp_confidence(adjusted),
            rationale: verdict.rationale,
            source: ClassificationSource::Rule,
        }
    }
}
