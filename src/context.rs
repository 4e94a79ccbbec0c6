//! Directory-aware confidence adjustment.

use crate::features::{DirectoryContext, FeatureSet, NamePattern, is_source_extension};
use crate::file_category::Category;
use std::path::Path;

const PACKAGE_MANIFESTS: &[&str] = &["package.json", "composer.json", "Gemfile"];
const REQUIREMENTS_FILES: &[&str] = &["requirements.txt", "pyproject.toml", "Pipfile"];
const BUILD_MANIFESTS: &[&str] = &[
    "Cargo.toml",
    "Makefile",
    "CMakeLists.txt",
    "build.gradle",
    "pom.xml",
    "go.mod",
];

/// Which project marker groups exist in the organizing root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectMarkers {
    pub package_manifest: bool,
    pub requirements: bool,
    pub build_manifest: bool,
    pub git: bool,
}

impl ProjectMarkers {
    /// Looks for marker files directly inside `root`.
    pub fn scan(root: &Path) -> Self {
        let any = |names: &[&str]| names.iter().any(|name| root.join(name).exists());
        Self {
            package_manifest: any(PACKAGE_MANIFESTS),
            requirements: any(REQUIREMENTS_FILES),
            build_manifest: any(BUILD_MANIFESTS),
            git: root.join(".git").exists(),
        }
    }

    pub fn count(&self) -> usize {
        [
            self.package_manifest,
            self.requirements,
            self.build_manifest,
            self.git,
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_project(&self) -> bool {
        self.count() >= 3
    }
}

/// Computes the additive context delta for one file.
#[derive(Debug, Clone, Copy)]
pub struct ContextBooster {
    markers: ProjectMarkers,
}

impl ContextBooster {
    pub fn new(markers: ProjectMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> ProjectMarkers {
        self.markers
    }

    pub fn boost(&self, features: &FeatureSet, category: Category) -> i16 {
        let mut delta = 0;

        if self.markers.is_project() {
            if features.extension.as_deref().is_some_and(is_source_extension) {
                delta += 10;
            } else if matches!(
                features.name_pattern,
                NamePattern::Test | NamePattern::Documentation
            ) {
                delta += 5;
            }
        }

        if features.recently_modified {
            delta += 2;
        }

        delta += match (features.directory_context, category) {
            (DirectoryContext::Downloads, _) => 3,
            (DirectoryContext::Documents, Category::Documents)
            | (DirectoryContext::Pictures, Category::Images)
            | (DirectoryContext::Videos, Category::Videos)
            | (DirectoryContext::Music, Category::Audio) => 5,
            _ => 0,
        };

        delta
    }
}

/// Clamps a confidence into [1, 99].
pub fn clamp_confidence(value: i16) -> u8 {
    value.clamp(1, 99) as u8
}
