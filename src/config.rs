//! TOML configuration: file filters and custom classification rules.
//!
//! Filters decide which files a run looks at. Custom rules are evaluated
//! before the built-in rule table, so a user can pin any file name pattern to
//! a category.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! [[rules]]
//! pattern = "*.psd"
//! category = "images"
//! subcategory = "design"
//! confidence = 97
//! ```

use crate::error::ConfigError;
use crate::file_category::Category;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Local configuration file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".dirsmithrc.toml";

/// Confidence given to custom rules that do not set one.
pub const DEFAULT_CUSTOM_CONFIDENCE: u8 = 95;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub filters: FilterRules,

    #[serde(default)]
    pub rules: Vec<CustomRule>,
}

/// Which files a run considers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A user rule pinning a file name glob to a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    /// Glob matched against the file name, case-insensitively.
    pub pattern: String,
    pub category: Category,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub confidence: Option<u8>,
}

impl OrganizerConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given (must exist)
    /// 2. `.dirsmithrc.toml` in the current directory
    /// 3. `~/.config/dirsmith/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("dirsmith").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        tracing::debug!(
            "Loaded configuration from {} ({} custom rules)",
            path.display(),
            config.rules.len()
        );
        Ok(config)
    }

    /// Compile patterns and validate custom rules.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let rules = self
            .rules
            .into_iter()
            .map(CompiledRule::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledConfig {
            filters: CompiledFilters::new(self.filters)?,
            rules,
        })
    }
}

/// Configuration ready for matching.
pub struct CompiledConfig {
    pub filters: CompiledFilters,
    pub rules: Vec<CompiledRule>,
}

/// A custom rule with its glob compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: Pattern,
    pub category: Category,
    pub subcategory: Option<String>,
    pub confidence: u8,
}

impl CompiledRule {
    fn new(rule: CustomRule) -> Result<Self, ConfigError> {
        let pattern = Pattern::new(&rule.pattern.to_lowercase())
            .map_err(|_| ConfigError::InvalidGlobPattern(rule.pattern.clone()))?;
        let confidence = rule.confidence.unwrap_or(DEFAULT_CUSTOM_CONFIDENCE);
        if !(1..=99).contains(&confidence) {
            return Err(ConfigError::ConfigInvalid(format!(
                "rule '{}': confidence {} is outside 1..=99",
                rule.pattern, confidence
            )));
        }
        Ok(Self {
            pattern,
            category: rule.category,
            subcategory: rule.subcategory,
            confidence,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(&file_name.to_lowercase())
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Pre-compiled filter structures.
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            include_patterns: compile_globs(&rules.include.patterns)?,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_regexes,
        })
    }

    /// Whether a file (path relative to the organizing root) takes part in a run.
    ///
    /// Include patterns win, then hidden files, exact names, extensions,
    /// globs and regexes exclude, in that order.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
