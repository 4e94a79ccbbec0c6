//! The classification chain: inspect, extract, rule table, optional ensemble,
//! context boost.

use crate::classifier::{ClassificationResult, RuleClassifier};
use crate::context::{ContextBooster, clamp_confidence};
use crate::ensemble::EnsembleClassifier;
use crate::features::{FeatureSet, extract};
use crate::inspector::{ContentFacts, Inspector};
use crate::model::ConfidenceModel;
use std::path::Path;

/// Everything learned about one file.
#[derive(Debug, Clone)]
pub struct Classified {
    pub facts: ContentFacts,
    pub features: FeatureSet,
    pub result: ClassificationResult,
}

/// Stateless per file; safe to share across rayon workers.
pub struct Pipeline {
    inspector: Inspector,
    rules: RuleClassifier,
    ensemble: EnsembleClassifier,
    booster: ContextBooster,
    model: ConfidenceModel,
}

impl Pipeline {
    pub fn new(
        inspector: Inspector,
        rules: RuleClassifier,
        ensemble: EnsembleClassifier,
        booster: ContextBooster,
        model: ConfidenceModel,
    ) -> Self {
        Self {
            inspector,
            rules,
            ensemble,
            booster,
            model,
        }
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    pub fn model(&self) -> &ConfidenceModel {
        &self.model
    }

    pub fn classify_path(&self, path: &Path) -> Classified {
        let facts = self.inspector.inspect(path);
        let features = extract(path, &facts);
        let result = self.classify_features(&features);
        Classified {
            facts,
            features,
            result,
        }
    }

    /// Rule table first; the ensemble replaces results below the category
    /// threshold; the context delta applies to whichever result survived.
    pub fn classify_features(&self, features: &FeatureSet) -> ClassificationResult {
        let rule = self.rules.classify(features, &self.model);
        let threshold = self.model.threshold(rule.category);
        let mut result = if rule.confidence < threshold {
            self.ensemble.fallback(features, &rule)
        } else {
            rule
        };

        let delta = self.booster.boost(features, result.category);
        result.confidence = clamp_confidence(result.confidence as i16 + delta);

        tracing::debug!(
            file = %features.file_name,
            category = %result.category,
            subcategory = result.subcategory.as_deref().unwrap_or("-"),
            confidence = result.confidence,
            source = ?result.source,
            "{}",
            result.rationale
        );
        result
    }
}
