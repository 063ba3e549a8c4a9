//! # jobmatch Matcher
//!
//! Training pipeline and online scorer built on `jobmatch-core` and
//! `jobmatch-storage`.
//!
//! - [`Trainer`] - Fits vocabulary, tf-idf and forest, evaluates, saves a bundle
//! - [`JobMatcher`] - Ranks jobs for a user's skills, classifier or heuristic
//! - [`Config`] - Training and scoring parameters, loadable from JSON

pub mod config;
pub mod evaluation;
pub mod scorer;
pub mod split;
pub mod training;

pub use config::{Config, MatcherConfig, TrainingConfig};
pub use evaluation::{ClassMetrics, ClassificationReport};
pub use scorer::{JobMatcher, MatchResult, Recommendations, ScoringMode};
pub use split::{stratified_split, Split};
pub use training::{Trainer, TrainingReport, TrainingSummary};
