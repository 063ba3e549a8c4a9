//! # jobmatch
//!
//! Job recommendations for a resume builder: a random-forest match
//! classifier trained offline from job postings, and an online scorer that
//! falls back to skill-overlap counting whenever no usable model is on disk.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! jobmatch train --jobs jobs.json --model-dir ./models
//! jobmatch recommend --jobs jobs.json --skills python,django,sql
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use jobmatch::prelude::*;
//! use std::sync::Arc;
//!
//! let jobs = load_jobs("jobs.json").unwrap();
//! let store = ArtifactStore::new("./models");
//!
//! // Offline
//! let trainer = Trainer::new(TrainingConfig::default()).unwrap();
//! trainer.train_and_save(&jobs, &store).unwrap();
//!
//! // Online
//! let cache = Arc::new(ModelCache::new(store));
//! let matcher = JobMatcher::new(cache, MatcherConfig::default());
//! let recs = matcher.score_jobs(&["python", "sql"], &jobs);
//! for m in &recs.matches {
//!     println!("{:>6.2}  {}", m.score, m.job);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `jobmatch-core` - Job model, vocabulary, tf-idf, features, labels, random forest
//! - `jobmatch-storage` - Artifact bundle persistence, model cache, job files
//! - `jobmatch-matcher` - Training pipeline, evaluation, online scorer, config

// Re-export core types
pub use jobmatch_core::{
    features, Error, FeatureVector, ForestConfig, JobRecord, LabelSet, MaxFeatures, RandomForest,
    Result, SkillVocabulary, TfidfConfig, TfidfVectorizer, TrainedArtifacts,
};

// Re-export storage
pub use jobmatch_storage::{
    load_jobs, save_jobs, ArtifactProvider, ArtifactStore, BundleManifest, ModelCache,
};

// Re-export matcher
pub use jobmatch_matcher::{
    ClassificationReport, Config, JobMatcher, MatchResult, MatcherConfig, Recommendations,
    ScoringMode, Trainer, TrainingConfig, TrainingReport, TrainingSummary,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_jobs, ArtifactProvider, ArtifactStore, Config, Error, JobMatcher, JobRecord,
        MatcherConfig, ModelCache, RandomForest, Recommendations, Result, ScoringMode,
        SkillVocabulary, TfidfVectorizer, TrainedArtifacts, Trainer, TrainingConfig,
    };
}
