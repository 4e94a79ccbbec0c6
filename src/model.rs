//! Persisted per-category confidence thresholds.
//!
//! The model is a static, user-editable table: it is read once when a run
//! starts, consulted by the fallback trigger, and only its `last_updated`
//! stamp is rewritten when an apply run finishes.
//!
//! ```json
//! {
//!   "thresholds": { "code": 80, "documents": 75, "misc": 60 },
//!   "created": "2026-01-01T00:00:00Z",
//!   "last_updated": "2026-01-02T00:00:00Z"
//! }
//! ```

use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Category → minimum acceptable rule confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceModel {
    #[serde(default)]
    pub thresholds: BTreeMap<Category, u8>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ConfidenceModel {
    /// A fresh model carrying the default thresholds.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            thresholds: Category::ALL
                .iter()
                .map(|category| (*category, default_threshold(*category)))
                .collect(),
            created: now,
            last_updated: now,
        }
    }

    /// Threshold below which the ensemble fallback takes over.
    pub fn threshold(&self, category: Category) -> u8 {
        self.thresholds
            .get(&category)
            .copied()
            .unwrap_or_else(|| default_threshold(category))
    }

    /// Per-category confidence delta applied after the rule table.
    ///
    /// Always zero: the table is configuration, not a learned model.
    pub fn adjustment(&self, _category: Category) -> i16 {
        0
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}

/// Built-in thresholds used for categories the file does not mention.
pub fn default_threshold(category: Category) -> u8 {
    match category {
        Category::Code => 80,
        Category::Documents => 75,
        Category::Images => 85,
        Category::Audio => 80,
        Category::Videos => 80,
        Category::Archives => 85,
        Category::Config => 80,
        Category::Data => 75,
        Category::System => 85,
        Category::Misc => 60,
    }
}

/// Reads and writes the model file.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: Option<PathBuf>,
}

impl ModelStore {
    /// A store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The per-user store under the platform config directory, if there is one.
    pub fn user_default() -> Self {
        Self {
            path: dirs::config_dir().map(|dir| dir.join("dirsmith").join("confidence_model.json")),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads the model, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(&self, now: DateTime<Utc>) -> ConfidenceModel {
        let Some(path) = &self.path else {
            return ConfidenceModel::new(now);
        };
        if !path.exists() {
            tracing::debug!("No confidence model at {}, using defaults", path.display());
            return ConfidenceModel::new(now);
        }

        match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable confidence model {}: {}",
                    path.display(),
                    e
                );
                ConfidenceModel::new(now)
            }
        }
    }

    /// Writes the model back. A store without a path is a no-op.
    pub fn save(&self, model: &ConfidenceModel) -> OrganizeResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let to_error = |reason: String| OrganizeError::Model {
            path: path.clone(),
            reason,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| to_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(model).map_err(|e| to_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| to_error(e.to_string()))
    }
}
