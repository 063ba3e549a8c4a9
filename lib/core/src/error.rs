use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Invalid feature dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Insufficient training data: {0}")]
    TrainingDataInsufficient(String),

    #[error("Empty vocabulary: {0}")]
    EmptyVocabulary(String),

    #[error("Training already in progress: {0}")]
    TrainingInProgress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors that only mean "no usable model": the scorer recovers from these
    /// by switching to the heuristic.
    #[must_use]
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Error::ArtifactMissing(_)
                | Error::ArtifactCorrupt(_)
                | Error::DimensionMismatch { .. }
                | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
