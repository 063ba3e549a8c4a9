// Model bundle persistence: classifier + tf-idf + skill vocabulary
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use jobmatch_core::{
    Error, RandomForest, Result, SkillVocabulary, TfidfVectorizer, TrainedArtifacts,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const MODEL_FILE: &str = "rf_model.bin";
pub const TFIDF_FILE: &str = "tfidf.bin";
pub const VOCAB_FILE: &str = "skills_vocab.json";
pub const MANIFEST_FILE: &str = "manifest.json";
const LOCK_FILE: &str = ".train.lock";

const FORMAT_VERSION: u32 = 1;

/// Written last; binds the three artifact files together by digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    pub bundle_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub tfidf_features: usize,
    pub vocabulary_size: usize,
    pub feature_dim: usize,
    pub n_trees: usize,
    /// file name -> sha256 hex digest
    pub checksums: BTreeMap<String, String>,
    /// Free-form training details (label threshold, evaluation, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Exclusive right to write a bundle directory
///
/// Held for the whole training run; the lock file is removed on drop.
#[derive(Debug)]
pub struct TrainingLock {
    path: PathBuf,
    _file: File,
}

impl TrainingLock {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TrainingLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove training lock {:?}: {}", self.path, e);
        }
    }
}

/// A directory holding one model bundle
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    #[must_use]
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// All three artifact files are present (says nothing about their contents)
    #[must_use]
    pub fn exists(&self) -> bool {
        [MODEL_FILE, TFIDF_FILE, VOCAB_FILE]
            .iter()
            .all(|f| self.path_of(f).is_file())
    }

    /// Take the single-writer lock for this directory
    pub fn lock(&self) -> Result<TrainingLock> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_of(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                Ok(TrainingLock { path, _file: file })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::TrainingInProgress(format!(
                "{:?} exists; remove it if no trainer is running",
                path
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Persist a bundle
    ///
    /// Each file is replaced atomically; the manifest goes last so readers
    /// never accept a mix of old and new artifacts.
    pub fn save(
        &self,
        lock: &TrainingLock,
        artifacts: &TrainedArtifacts,
        metadata: Map<String, Value>,
    ) -> Result<BundleManifest> {
        if lock.path() != self.path_of(LOCK_FILE) {
            return Err(Error::TrainingInProgress(format!(
                "lock {:?} does not guard {:?}",
                lock.path(),
                self.dir
            )));
        }
        artifacts.validate()?;

        let model = bincode::serialize(&artifacts.classifier)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let tfidf = bincode::serialize(&artifacts.tfidf)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let vocab = serde_json::to_vec_pretty(&artifacts.vocabulary)?;

        let mut checksums = BTreeMap::new();
        for (name, data) in [(MODEL_FILE, &model), (TFIDF_FILE, &tfidf), (VOCAB_FILE, &vocab)] {
            write_atomic(&self.path_of(name), data)?;
            checksums.insert(name.to_string(), sha256_hex(data));
            debug!("Wrote {} ({} bytes)", name, data.len());
        }

        let manifest = BundleManifest {
            format_version: FORMAT_VERSION,
            bundle_id: Uuid::new_v4(),
            created_at: Utc::now(),
            tfidf_features: artifacts.tfidf.feature_count(),
            vocabulary_size: artifacts.vocabulary.len(),
            feature_dim: artifacts.feature_dim(),
            n_trees: artifacts.classifier.n_trees(),
            checksums,
            metadata,
        };
        write_atomic(&self.path_of(MANIFEST_FILE), &serde_json::to_vec_pretty(&manifest)?)?;

        info!(
            "Saved model bundle {} to {:?} ({} features)",
            manifest.bundle_id, self.dir, manifest.feature_dim
        );
        Ok(manifest)
    }

    /// Load and cross-check a bundle
    ///
    /// Missing files give [`Error::ArtifactMissing`]; anything unreadable,
    /// tampered with or dimensionally inconsistent gives
    /// [`Error::ArtifactCorrupt`] or [`Error::DimensionMismatch`].
    pub fn load(&self) -> Result<(TrainedArtifacts, BundleManifest)> {
        for name in [MODEL_FILE, TFIDF_FILE, VOCAB_FILE] {
            if !self.path_of(name).is_file() {
                return Err(Error::ArtifactMissing(format!("{:?}", self.path_of(name))));
            }
        }
        let manifest = self.manifest()?;

        let model = self.read_verified(&manifest, MODEL_FILE)?;
        let tfidf = self.read_verified(&manifest, TFIDF_FILE)?;
        let vocab = self.read_verified(&manifest, VOCAB_FILE)?;

        let classifier: RandomForest = bincode::deserialize(&model)
            .map_err(|e| Error::ArtifactCorrupt(format!("{}: {}", MODEL_FILE, e)))?;
        let tfidf: TfidfVectorizer = bincode::deserialize(&tfidf)
            .map_err(|e| Error::ArtifactCorrupt(format!("{}: {}", TFIDF_FILE, e)))?;
        let vocabulary: SkillVocabulary = serde_json::from_slice(&vocab)
            .map_err(|e| Error::ArtifactCorrupt(format!("{}: {}", VOCAB_FILE, e)))?;

        let artifacts = TrainedArtifacts::new(classifier, tfidf, vocabulary)?;
        if artifacts.feature_dim() != manifest.feature_dim {
            return Err(Error::DimensionMismatch {
                expected: manifest.feature_dim,
                actual: artifacts.feature_dim(),
            });
        }

        debug!("Loaded model bundle {} from {:?}", manifest.bundle_id, self.dir);
        Ok((artifacts, manifest))
    }

    pub fn manifest(&self) -> Result<BundleManifest> {
        let path = self.path_of(MANIFEST_FILE);
        let data = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ArtifactCorrupt(format!("{:?} missing", path)),
            _ => Error::Io(e),
        })?;
        let manifest: BundleManifest = serde_json::from_slice(&data)
            .map_err(|e| Error::ArtifactCorrupt(format!("{}: {}", MANIFEST_FILE, e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::ArtifactCorrupt(format!(
                "unsupported bundle format {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    /// Delete the bundle files; returns whether anything was removed
    pub fn remove(&self) -> Result<bool> {
        let mut removed = false;
        for name in [MANIFEST_FILE, MODEL_FILE, TFIDF_FILE, VOCAB_FILE] {
            match fs::remove_file(self.path_of(name)) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(removed)
    }

    fn read_verified(&self, manifest: &BundleManifest, name: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.path_of(name))?;
        let expected = manifest
            .checksums
            .get(name)
            .ok_or_else(|| Error::ArtifactCorrupt(format!("no checksum recorded for {}", name)))?;
        let actual = sha256_hex(&data);
        if *expected != actual {
            return Err(Error::ArtifactCorrupt(format!(
                "{} checksum mismatch (expected {}, got {})",
                name, expected, actual
            )));
        }
        Ok(data)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(data))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
