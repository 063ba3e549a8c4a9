use crate::features::{self, feature_dim};
use crate::{
    Error, FeatureVector, JobRecord, RandomForest, Result, SkillVocabulary, TfidfVectorizer,
};

/// Everything the classifier path needs, kept together because the meaning
/// of every feature position depends on all three parts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifacts {
    pub classifier: RandomForest,
    pub tfidf: TfidfVectorizer,
    pub vocabulary: SkillVocabulary,
}

impl TrainedArtifacts {
    /// Bundle the parts, rejecting combinations that disagree on dimensionality
    pub fn new(
        classifier: RandomForest,
        tfidf: TfidfVectorizer,
        vocabulary: SkillVocabulary,
    ) -> Result<Self> {
        let artifacts = Self {
            classifier,
            tfidf,
            vocabulary,
        };
        artifacts.validate()?;
        Ok(artifacts)
    }

    #[inline]
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        feature_dim(&self.tfidf, &self.vocabulary)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.vocabulary.is_well_formed() {
            return Err(Error::ArtifactCorrupt("skill vocabulary is not sorted and unique".into()));
        }
        if !self.tfidf.is_well_formed() {
            return Err(Error::ArtifactCorrupt("tf-idf state is inconsistent".into()));
        }
        if !self.classifier.is_well_formed() {
            return Err(Error::ArtifactCorrupt("classifier trees are malformed".into()));
        }
        if self.classifier.n_features() != self.feature_dim() {
            return Err(Error::DimensionMismatch {
                expected: self.classifier.n_features(),
                actual: self.feature_dim(),
            });
        }
        Ok(())
    }

    pub fn features(&self, job: &JobRecord) -> FeatureVector {
        features::transform_job(job, &self.tfidf, &self.vocabulary)
    }

    /// Probability that `job` is a good match under the trained model
    pub fn score(&self, job: &JobRecord) -> Result<f64> {
        self.classifier.positive_probability(&self.features(job))
    }

    /// Feature name for each vector position (terms, then `skill:<name>`)
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.tfidf
            .terms()
            .iter()
            .cloned()
            .chain(self.vocabulary.iter().map(|s| format!("skill:{}", s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForestConfig, TfidfConfig};

    fn train(jobs: &[JobRecord]) -> (RandomForest, TfidfVectorizer, SkillVocabulary) {
        let vocab = SkillVocabulary::build(jobs);
        let docs: Vec<&str> = jobs.iter().map(|j| j.description.as_str()).collect();
        let tfidf = TfidfVectorizer::fit(TfidfConfig::default(), &docs).unwrap();
        let x = features::transform_batch(jobs, &tfidf, &vocab);
        let y: Vec<usize> = (0..jobs.len()).map(|i| i % 2).collect();
        let config = ForestConfig {
            n_estimators: 5,
            ..Default::default()
        };
        (RandomForest::fit(config, &x, &y).unwrap(), tfidf, vocab)
    }

    fn jobs() -> Vec<JobRecord> {
        vec![
            JobRecord::new(1, "a", "python django api").with_skills(["python", "django"]),
            JobRecord::new(2, "b", "java spring").with_skills(["java"]),
            JobRecord::new(3, "c", "react frontend").with_skills(["react", "sql"]),
            JobRecord::new(4, "d", "cobol batch").with_skills(["cobol"]),
        ]
    }

    #[test]
    fn test_consistent_bundle() {
        let (forest, tfidf, vocab) = train(&jobs());
        let artifacts = TrainedArtifacts::new(forest, tfidf, vocab).unwrap();
        assert_eq!(artifacts.feature_names().len(), artifacts.feature_dim());

        let p = artifacts.score(&jobs()[0]).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_vocabulary_drift_detected() {
        let (forest, tfidf, _) = train(&jobs());
        let drifted = SkillVocabulary::from_skills(["python"]);
        let err = TrainedArtifacts::new(forest, tfidf, drifted).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert!(err.is_artifact_error());
    }

    #[test]
    fn test_featurizer_with_invalid_config_rejected() {
        let (forest, tfidf, vocab) = train(&jobs());
        let mut state = serde_json::to_value(&tfidf).unwrap();
        state["config"]["ngram_range"] = serde_json::json!([0, 2]);
        let tfidf: TfidfVectorizer = serde_json::from_value(state).unwrap();

        let err = TrainedArtifacts::new(forest, tfidf, vocab).unwrap_err();
        assert!(matches!(err, Error::ArtifactCorrupt(_)));
    }
}
