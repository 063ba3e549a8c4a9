use jobmatch_core::{
    Error, ForestConfig, Result, TfidfConfig, DEFAULT_REFERENCE_SKILLS, DEFAULT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Offline training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Skill profile that defines a "good" job when generating labels
    pub reference_skills: Vec<String>,
    /// Initial overlap threshold; relaxed towards 1 if labels are one class
    pub label_threshold: usize,
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    pub split_seed: u64,
    pub tfidf: TfidfConfig,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            reference_skills: DEFAULT_REFERENCE_SKILLS.iter().map(|s| s.to_string()).collect(),
            label_threshold: DEFAULT_THRESHOLD,
            test_size: 0.2,
            split_seed: 42,
            tfidf: TfidfConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.reference_skills.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::InvalidConfig("reference_skills is empty".into()));
        }
        if self.label_threshold == 0 {
            return Err(Error::InvalidConfig("label_threshold must be at least 1".into()));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        self.tfidf.validate()?;
        self.forest.validate()
    }
}

/// Online scoring parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Upper bound on jobs scored per request
    pub max_candidates: usize,
    /// Length of the returned ranking
    pub top_n: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_candidates: 200,
            top_n: 50,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 || self.top_n == 0 {
            return Err(Error::InvalidConfig(
                "max_candidates and top_n must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model_dir: PathBuf,
    pub training: TrainingConfig,
    pub matcher: MatcherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models"),
            training: TrainingConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

impl Config {
    /// Read a JSON config file; omitted fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let config: Config = serde_json::from_slice(&data)
            .map_err(|e| Error::InvalidConfig(format!("{:?}: {}", path.as_ref(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        self.matcher.validate()
    }
}
