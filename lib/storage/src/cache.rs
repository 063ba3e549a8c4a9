use crate::bundle::{ArtifactStore, BundleManifest};
use jobmatch_core::{Result, TrainedArtifacts};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Source of trained artifacts for the online scorer
pub trait ArtifactProvider: Send + Sync {
    fn artifacts(&self) -> Result<Arc<TrainedArtifacts>>;
}

/// Uncached: every call reads and verifies the bundle from disk
impl ArtifactProvider for ArtifactStore {
    fn artifacts(&self) -> Result<Arc<TrainedArtifacts>> {
        self.load().map(|(artifacts, _)| Arc::new(artifacts))
    }
}

struct LoadedBundle {
    artifacts: Arc<TrainedArtifacts>,
    manifest: BundleManifest,
}

/// Process-lifetime model cache
///
/// Empty until the first successful load, read-only afterwards. Failed loads
/// are not remembered, so a bundle that appears later is picked up on the
/// next request. Call [`invalidate`](Self::invalidate) after retraining.
pub struct ModelCache {
    store: ArtifactStore,
    slot: RwLock<Option<LoadedBundle>>,
}

impl ModelCache {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            slot: RwLock::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn get(&self) -> Result<Arc<TrainedArtifacts>> {
        if let Some(bundle) = self.slot.read().as_ref() {
            return Ok(bundle.artifacts.clone());
        }

        let mut slot = self.slot.write();
        // another caller may have loaded it while we waited for the write lock
        if let Some(bundle) = slot.as_ref() {
            return Ok(bundle.artifacts.clone());
        }

        let (artifacts, manifest) = self.store.load()?;
        info!(
            "Model bundle {} cached ({} trees, {} features)",
            manifest.bundle_id, manifest.n_trees, manifest.feature_dim
        );
        let artifacts = Arc::new(artifacts);
        *slot = Some(LoadedBundle {
            artifacts: artifacts.clone(),
            manifest,
        });
        Ok(artifacts)
    }

    /// Drop the cached bundle; the next `get` reloads from disk
    pub fn invalidate(&self) {
        if let Some(bundle) = self.slot.write().take() {
            info!("Model bundle {} evicted from cache", bundle.manifest.bundle_id);
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }

    #[must_use]
    pub fn bundle_id(&self) -> Option<Uuid> {
        self.slot.read().as_ref().map(|b| b.manifest.bundle_id)
    }
}

impl ArtifactProvider for ModelCache {
    fn artifacts(&self) -> Result<Arc<TrainedArtifacts>> {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::{
        features, Error, ForestConfig, JobRecord, RandomForest, SkillVocabulary, TfidfConfig,
        TfidfVectorizer,
    };
    use serde_json::Map;

    fn save_bundle(store: &ArtifactStore, n_estimators: usize) {
        let jobs = vec![
            JobRecord::new(1, "a", "python django").with_skills(["python"]),
            JobRecord::new(2, "b", "java spring").with_skills(["java"]),
        ];
        let vocab = SkillVocabulary::build(&jobs);
        let docs: Vec<&str> = jobs.iter().map(|j| j.description.as_str()).collect();
        let tfidf = TfidfVectorizer::fit(TfidfConfig::default(), &docs).unwrap();
        let x = features::transform_batch(&jobs, &tfidf, &vocab);
        let config = ForestConfig {
            n_estimators,
            ..Default::default()
        };
        let forest = RandomForest::fit(config, &x, &[1, 0]).unwrap();
        let artifacts = TrainedArtifacts::new(forest, tfidf, vocab).unwrap();
        let lock = store.lock().unwrap();
        store.save(&lock, &artifacts, Map::new()).unwrap();
    }

    #[test]
    fn test_empty_store_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(ArtifactStore::new(dir.path()));

        assert!(matches!(cache.get(), Err(Error::ArtifactMissing(_))));
        assert!(!cache.is_loaded());

        save_bundle(cache.store(), 3);
        assert!(cache.get().is_ok());
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_cached_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        save_bundle(&store, 3);

        let cache = ModelCache::new(store.clone());
        let first = cache.get().unwrap();
        let id = cache.bundle_id().unwrap();

        // retrain on disk; the cache keeps serving the old bundle
        save_bundle(&store, 4);
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.classifier.n_trees(), 3);

        cache.invalidate();
        let third = cache.get().unwrap();
        assert_eq!(third.classifier.n_trees(), 4);
        assert_ne!(cache.bundle_id().unwrap(), id);
    }
}
