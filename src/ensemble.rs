//! Weighted-vote fallback for low-confidence rule results.

use crate::classifier::{ClassificationResult, ClassificationSource};
use crate::context::clamp_confidence;
use crate::features::{ContentHint, FeatureSet, NamePattern};
use crate::file_category::{Category, FileMapper};

const EXTENSION_WEIGHT: u32 = 3;
const MIME_WEIGHT: u32 = 2;
const DOTFILE_WEIGHT: u32 = 2;
const PATTERN_WEIGHT: u32 = 1;
const SIZE_WEIGHT: u32 = 1;

/// Confidence retained from the rule result when the ensemble takes over.
const CONFIDENCE_FACTOR: f64 = 0.8;

/// Category tally that remembers first-registration order.
#[derive(Debug, Default)]
struct Tally {
    votes: Vec<(Category, u32)>,
}

impl Tally {
    fn vote(&mut self, category: Category, weight: u32) {
        match self.votes.iter_mut().find(|(c, _)| *c == category) {
            Some((_, total)) => *total += weight,
            None => self.votes.push((category, weight)),
        }
    }

    /// Highest total; ties go to the category registered first.
    fn winner(&self) -> Option<Category> {
        let mut best: Option<(Category, u32)> = None;
        for (category, total) in &self.votes {
            if best.is_none_or(|(_, top)| *total > top) {
                best = Some((*category, *total));
            }
        }
        best.map(|(category, _)| category)
    }

    fn describe(&self) -> String {
        self.votes
            .iter()
            .map(|(category, total)| format!("{} {}", category, total))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Second-opinion classifier built from independent weak signals.
#[derive(Debug, Clone, Default)]
pub struct EnsembleClassifier {
    mapper: FileMapper,
}

impl EnsembleClassifier {
    pub fn new(mapper: FileMapper) -> Self {
        Self { mapper }
    }

    /// Replaces a rule result whose confidence fell below its threshold.
    pub fn fallback(&self, features: &FeatureSet, rule: &ClassificationResult) -> ClassificationResult {
        let mut tally = Tally::default();

        if let Some(ext) = features.extension.as_deref()
            && let Some(category) = self.mapper.extension_to_category(ext)
        {
            tally.vote(category, EXTENSION_WEIGHT);
        }

        if let Some(mime) = features.mime()
            && let Some(category) = self.mapper.mime_to_category(&mime)
        {
            tally.vote(category, MIME_WEIGHT);
        }

        if features.dotfile {
            tally.vote(Category::Config, DOTFILE_WEIGHT);
        } else if let Some(category) = pattern_vote(features.name_pattern) {
            tally.vote(category, PATTERN_WEIGHT);
        }

        if let Some(category) = size_vote(features) {
            tally.vote(category, SIZE_WEIGHT);
        }

        let category = tally.winner().unwrap_or(Category::Misc);
        let confidence = (rule.confidence as f64 * CONFIDENCE_FACTOR).round() as i16;
        let rationale = if tally.votes.is_empty() {
            format!("rule confidence {} too low, no votes cast", rule.confidence)
        } else {
            format!(
                "rule confidence {} too low, ensemble votes: {}",
                rule.confidence,
                tally.describe()
            )
        };

        // The rule's subcategory only makes sense under the rule's category.
        let subcategory = if category == rule.category {
            rule.subcategory.clone()
        } else {
            None
        };

        ClassificationResult {
            category,
            subcategory,
            confidence: clamp_confidence(confidence),
            rationale,
            source: ClassificationSource::Ensemble,
        }
    }
}

fn pattern_vote(pattern: NamePattern) -> Option<Category> {
    match pattern {
        NamePattern::Screenshot => Some(Category::Images),
        NamePattern::Backup | NamePattern::Temporary => Some(Category::System),
        NamePattern::Test => Some(Category::Code),
        NamePattern::Config => Some(Category::Config),
        NamePattern::Documentation | NamePattern::Legal | NamePattern::Draft | NamePattern::Final => {
            Some(Category::Documents)
        }
        NamePattern::Dated | NamePattern::Versioned | NamePattern::None => None,
    }
}

fn size_vote(features: &FeatureSet) -> Option<Category> {
    match features.content_hint {
        ContentHint::Config => Some(Category::Config),
        ContentHint::Markdown => Some(Category::Documents),
        hint if hint.is_data() => Some(Category::Data),
        ContentHint::Plain if !features.size_class.is_big() => Some(Category::Documents),
        ContentHint::Binary if features.size_class.is_big() => Some(if features.mime_is("video") {
            Category::Videos
        } else {
            Category::Archives
        }),
        _ => None,
    }
}
