// Job records on disk: a JSON array of JobRecord
use atomicwrites::{AtomicFile, OverwriteBehavior};
use jobmatch_core::{Error, JobRecord, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Read job records; duplicate ids keep their first occurrence
pub fn load_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<JobRecord>> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let records: Vec<JobRecord> = serde_json::from_slice(&data)
        .map_err(|e| Error::Serialization(format!("{:?}: {}", path, e)))?;

    let mut seen = HashSet::with_capacity(records.len());
    let mut jobs = Vec::with_capacity(records.len());
    for job in records {
        if seen.insert(job.id) {
            jobs.push(job);
        } else {
            warn!("Skipping duplicate job id {} in {:?}", job.id, path);
        }
    }

    debug!("Loaded {} jobs from {:?}", jobs.len(), path);
    Ok(jobs)
}

pub fn save_jobs<P: AsRef<Path>>(path: P, jobs: &[JobRecord]) -> Result<()> {
    let data = serde_json::to_vec_pretty(jobs)?;
    AtomicFile::new(path.as_ref(), OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(&data))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        let mut inactive = JobRecord::new(2, "Old role", "closed");
        inactive.set_active(false);
        let jobs = vec![
            JobRecord::new(1, "Data Engineer", "Spark and SQL").with_skills(["sql"]),
            inactive,
        ];

        save_jobs(&path, &jobs).unwrap();
        assert_eq!(load_jobs(&path).unwrap(), jobs);
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(
            &path,
            r#"[{"id": 1, "title": "first"}, {"id": 1, "title": "second"}, {"id": 2, "title": "third"}]"#,
        )
        .unwrap();

        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "first");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_jobs(&path), Err(Error::Serialization(_))));
    }
}
