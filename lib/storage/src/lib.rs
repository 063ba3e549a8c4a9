pub mod bundle;
pub mod cache;
pub mod jobs;

pub use bundle::{ArtifactStore, BundleManifest, TrainingLock};
pub use cache::{ArtifactProvider, ModelCache};
pub use jobs::{load_jobs, save_jobs};
