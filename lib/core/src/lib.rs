//! # jobmatch Core
//!
//! Core library for jobmatch, the job recommendation engine of a resume builder.
//!
//! This crate provides the data model and the learning pieces:
//!
//! - [`JobRecord`] - A job posting supplied by the surrounding application
//! - [`SkillVocabulary`] - Sorted skill set defining the binary feature block
//! - [`TfidfVectorizer`] - Unigram + bigram TF-IDF over job descriptions
//! - [`features`] - `description + skills -> FeatureVector`
//! - [`labels`] - Skill-overlap training labels with threshold relaxation
//! - [`RandomForest`] - Bootstrap-aggregated CART classifier
//! - [`TrainedArtifacts`] - Classifier, featurizer and vocabulary kept together
//!
//! ## Example
//!
//! ```rust
//! use jobmatch_core::{features, JobRecord, SkillVocabulary, TfidfConfig, TfidfVectorizer};
//!
//! let jobs = vec![
//!     JobRecord::new(1, "Backend Engineer", "Python and Django APIs")
//!         .with_skills(["python", "django"]),
//!     JobRecord::new(2, "Mobile Developer", "Kotlin apps for Android")
//!         .with_skills(["kotlin"]),
//! ];
//! let vocab = SkillVocabulary::build(&jobs);
//! let docs: Vec<&str> = jobs.iter().map(|j| j.description.as_str()).collect();
//! let tfidf = TfidfVectorizer::fit(TfidfConfig::default(), &docs).unwrap();
//!
//! let v = features::transform_job(&jobs[0], &tfidf, &vocab);
//! assert_eq!(v.dim(), tfidf.feature_count() + vocab.len());
//! ```

pub mod artifacts;
pub mod error;
pub mod features;
pub mod forest;
pub mod job;
pub mod labels;
pub mod tfidf;
pub mod vector;
pub mod vocab;

pub use artifacts::TrainedArtifacts;
pub use error::{Error, Result};
pub use forest::{DecisionTree, ForestConfig, MaxFeatures, RandomForest};
pub use job::{normalize_skill, JobRecord};
pub use labels::{LabelSet, DEFAULT_REFERENCE_SKILLS, DEFAULT_THRESHOLD};
pub use tfidf::{TfidfConfig, TfidfVectorizer};
pub use vector::FeatureVector;
pub use vocab::{SkillVocabulary, COMMON_SKILLS};
