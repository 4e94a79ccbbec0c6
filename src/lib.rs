//! dirsmith - heuristic file classification and directory organization
//!
//! Every file runs through a deterministic, explainable pipeline: content
//! inspection, feature extraction, an ordered rule table, a weighted-vote
//! fallback for low-confidence results and a directory-context boost. The
//! planner then picks a collision-free destination, moves are journaled, and
//! the most recent run can be undone.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod context;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod file_category;
pub mod inspector;
pub mod journal;
pub mod model;
pub mod organizer;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod undo;

pub use classifier::{ClassificationResult, ClassificationSource, RuleClassifier};
pub use config::{CompiledConfig, CompiledFilters, OrganizerConfig};
pub use error::{ConfigError, MoveError, OrganizeError, OrganizeResult, UndoError};
pub use file_category::{Category, FileMapper};
pub use journal::{Journal, JournalEntry, OperationRecord};
pub use model::{ConfidenceModel, ModelStore};
pub use organizer::{FileOutcome, OrganizeMode, OrganizeOptions, OrganizeReport, Organizer};
pub use undo::{UndoManager, UndoReport};

pub use cli::{CliSettings, OrganizeCommand, run_cli};
