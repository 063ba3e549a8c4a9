//! Offline classifier training
//!
//! active jobs -> vocabulary -> tf-idf -> feature matrix -> labels
//! -> stratified split -> random forest -> evaluation -> bundle
//!
//! Nothing is written unless every step succeeds.

use crate::config::TrainingConfig;
use crate::evaluation::ClassificationReport;
use crate::split::stratified_split;
use jobmatch_core::labels::generate_labels_relaxed;
use jobmatch_core::{
    features, Error, FeatureVector, JobRecord, RandomForest, Result, SkillVocabulary,
    TfidfVectorizer, TrainedArtifacts,
};
use jobmatch_storage::{ArtifactStore, BundleManifest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// What a training run saw and produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub n_jobs: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub label_threshold: usize,
    pub positives: usize,
    pub negatives: usize,
    pub tfidf_features: usize,
    pub vocabulary_size: usize,
    /// `None` when the hold-out set came out empty
    pub evaluation: Option<ClassificationReport>,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub summary: TrainingSummary,
    pub manifest: BundleManifest,
}

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit all artifacts in memory
    pub fn fit(&self, jobs: &[JobRecord]) -> Result<(TrainedArtifacts, TrainingSummary)> {
        let active: Vec<JobRecord> = jobs.iter().filter(|j| j.is_active()).cloned().collect();
        if active.is_empty() {
            return Err(Error::TrainingDataInsufficient(format!(
                "no active jobs among {} records",
                jobs.len()
            )));
        }
        info!("Training on {} active jobs ({} total)", active.len(), jobs.len());

        let vocabulary = SkillVocabulary::build(&active);
        let descriptions: Vec<&str> = active.iter().map(|j| j.description.as_str()).collect();
        let tfidf = TfidfVectorizer::fit(self.config.tfidf.clone(), &descriptions)?;
        info!(
            "Vocabulary: {} skills, {} tf-idf terms",
            vocabulary.len(),
            tfidf.feature_count()
        );

        let x = features::transform_batch(&active, &tfidf, &vocabulary);

        let labels = generate_labels_relaxed(
            &active,
            &self.config.reference_skills,
            self.config.label_threshold,
        )?;
        if labels.threshold < self.config.label_threshold {
            warn!(
                "Labels were a single class at threshold {}; relaxed to {}",
                self.config.label_threshold, labels.threshold
            );
        }
        info!(
            "Labels: {} positive, {} negative (threshold {})",
            labels.positives(),
            labels.negatives(),
            labels.threshold
        );

        let split = stratified_split(&labels.labels, self.config.test_size, self.config.split_seed);
        let x_train: Vec<FeatureVector> = split.train.iter().map(|&i| x[i].clone()).collect();
        let y_train: Vec<usize> = split.train.iter().map(|&i| labels.labels[i]).collect();

        info!(
            "Fitting {} trees on {} rows ({} held out)",
            self.config.forest.n_estimators,
            split.train.len(),
            split.test.len()
        );
        let classifier = RandomForest::fit(self.config.forest.clone(), &x_train, &y_train)?;

        let evaluation = if split.test.is_empty() {
            warn!("Hold-out set is empty; skipping evaluation");
            None
        } else {
            let y_true: Vec<usize> = split.test.iter().map(|&i| labels.labels[i]).collect();
            let y_pred = split
                .test
                .iter()
                .map(|&i| classifier.predict(&x[i]))
                .collect::<Result<Vec<usize>>>()?;
            let report = ClassificationReport::compute(&y_true, &y_pred, classifier.n_classes());
            info!("Evaluation on {} held-out jobs:\n{}", y_true.len(), report);
            Some(report)
        };

        let summary = TrainingSummary {
            n_jobs: active.len(),
            n_train: split.train.len(),
            n_test: split.test.len(),
            label_threshold: labels.threshold,
            positives: labels.positives(),
            negatives: labels.negatives(),
            tfidf_features: tfidf.feature_count(),
            vocabulary_size: vocabulary.len(),
            evaluation,
        };

        let artifacts = TrainedArtifacts::new(classifier, tfidf, vocabulary)?;
        Ok((artifacts, summary))
    }

    /// Train and persist as one bundle under the store's single-writer lock
    pub fn train_and_save(
        &self,
        jobs: &[JobRecord],
        store: &ArtifactStore,
    ) -> Result<TrainingReport> {
        let lock = store.lock()?;
        let (artifacts, summary) = self.fit(jobs)?;

        let metadata = match serde_json::to_value(&summary)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        let manifest = store.save(&lock, &artifacts, metadata)?;

        Ok(TrainingReport { summary, manifest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::ForestConfig;

    fn config() -> TrainingConfig {
        TrainingConfig {
            forest: ForestConfig {
                n_estimators: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn jobs() -> Vec<JobRecord> {
        let mut jobs = Vec::new();
        for i in 0..10u64 {
            jobs.push(
                JobRecord::new(i, "Python Developer", "Build REST APIs with Python and Django")
                    .with_skills(["python", "django", "rest"]),
            );
            jobs.push(
                JobRecord::new(100 + i, "Embedded Engineer", "Firmware in C for microcontrollers")
                    .with_skills(["c", "rtos"]),
            );
        }
        jobs
    }

    #[test]
    fn test_fit_produces_consistent_artifacts() {
        let trainer = Trainer::new(config()).unwrap();
        let (artifacts, summary) = trainer.fit(&jobs()).unwrap();

        assert!(artifacts.validate().is_ok());
        assert_eq!(summary.n_jobs, 20);
        assert_eq!(summary.n_train + summary.n_test, 20);
        assert_eq!(summary.n_test, 4);
        assert_eq!(summary.label_threshold, 2);
        assert_eq!(summary.positives, 10);

        let report = summary.evaluation.unwrap();
        assert_eq!(report.support, 4);
        assert!((report.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inactive_jobs_ignored() {
        let mut all = jobs();
        for job in all.iter_mut().filter(|j| j.id >= 100) {
            job.set_active(false);
        }
        // only positives remain active -> single class even at k = 1
        let err = Trainer::new(config()).unwrap().fit(&all).unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient(_)));
    }

    #[test]
    fn test_no_active_jobs_is_fatal_and_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut all = jobs();
        all.iter_mut().for_each(|j| j.set_active(false));

        let err = Trainer::new(config()).unwrap().train_and_save(&all, &store).unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient(_)));
        assert!(!store.exists());
        // lock released on failure
        assert!(store.lock().is_ok());
    }

    #[test]
    fn test_train_and_save_records_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let report = Trainer::new(config()).unwrap().train_and_save(&jobs(), &store).unwrap();
        assert!(store.exists());
        assert_eq!(report.manifest.n_trees, 10);
        assert_eq!(report.manifest.metadata["label_threshold"], 2);
        assert_eq!(report.manifest.metadata["n_jobs"], 20);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = TrainingConfig {
            test_size: 0.0,
            ..config()
        };
        assert!(matches!(Trainer::new(bad), Err(Error::InvalidConfig(_))));
    }
}
