//! Training labels from skill overlap
//!
//! A job is a positive example when it shares at least `k` skills with a
//! reference skill set. If every job lands in the same class the threshold is
//! relaxed one step at a time down to 1; a single class at `k = 1` aborts.

use crate::job::{normalize_skill, JobRecord};
use crate::{Error, Result};
use ahash::AHashSet;

/// Reference profile used to label jobs when none is configured
pub const DEFAULT_REFERENCE_SKILLS: &[&str] =
    &["python", "django", "rest", "sql", "javascript", "react"];

pub const DEFAULT_THRESHOLD: usize = 2;

pub const NEGATIVE: usize = 0;
pub const POSITIVE: usize = 1;

/// Labels together with the threshold that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    pub labels: Vec<usize>,
    pub threshold: usize,
}

impl LabelSet {
    #[must_use]
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == POSITIVE).count()
    }

    #[must_use]
    pub fn negatives(&self) -> usize {
        self.labels.len() - self.positives()
    }
}

/// Label every job with a fixed threshold `k`
pub fn generate_labels<S: AsRef<str>>(
    jobs: &[JobRecord],
    reference: &[S],
    k: usize,
) -> Vec<usize> {
    let reference: AHashSet<String> = reference
        .iter()
        .filter_map(|s| normalize_skill(s.as_ref()))
        .collect();

    jobs.iter()
        .map(|job| {
            let skills: AHashSet<String> = job.normalized_skills().collect();
            let overlap = skills.intersection(&reference).count();
            if overlap >= k {
                POSITIVE
            } else {
                NEGATIVE
            }
        })
        .collect()
}

/// Label jobs, lowering `k` until both classes are present
pub fn generate_labels_relaxed<S: AsRef<str>>(
    jobs: &[JobRecord],
    reference: &[S],
    k: usize,
) -> Result<LabelSet> {
    if jobs.is_empty() {
        return Err(Error::TrainingDataInsufficient("no jobs to label".into()));
    }

    let mut threshold = k.max(1);
    loop {
        let labels = generate_labels(jobs, reference, threshold);
        if has_both_classes(&labels) {
            return Ok(LabelSet { labels, threshold });
        }
        if threshold == 1 {
            return Err(Error::TrainingDataInsufficient(format!(
                "labels of {} jobs form a single class even at threshold 1",
                jobs.len()
            )));
        }
        threshold -= 1;
    }
}

fn has_both_classes(labels: &[usize]) -> bool {
    labels.contains(&POSITIVE) && labels.contains(&NEGATIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs() -> Vec<JobRecord> {
        vec![
            JobRecord::new(1, "a", "").with_skills(["python", "django"]),
            JobRecord::new(2, "b", "").with_skills(["java"]),
        ]
    }

    #[test]
    fn test_threshold_two() {
        let labels = generate_labels(&jobs(), &["python", "django", "sql"], 2);
        assert_eq!(labels, vec![POSITIVE, NEGATIVE]);
    }

    #[test]
    fn test_threshold_one_no_overlap_stays_negative() {
        let labels = generate_labels(&jobs(), &["python", "django", "sql"], 1);
        assert_eq!(labels, vec![POSITIVE, NEGATIVE]);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let jobs = vec![JobRecord::new(1, "a", "").with_skills([" Python", "SQL "])];
        assert_eq!(generate_labels(&jobs, &["python", "sql"], 2), vec![POSITIVE]);
    }

    #[test]
    fn test_relaxes_threshold() {
        let jobs = vec![
            JobRecord::new(1, "a", "").with_skills(["python"]),
            JobRecord::new(2, "b", "").with_skills(["java"]),
        ];
        let set = generate_labels_relaxed(&jobs, DEFAULT_REFERENCE_SKILLS, 2).unwrap();
        assert_eq!(set.threshold, 1);
        assert_eq!(set.labels, vec![POSITIVE, NEGATIVE]);
        assert_eq!(set.positives(), 1);
        assert_eq!(set.negatives(), 1);
    }

    #[test]
    fn test_keeps_initial_threshold_when_balanced() {
        let set = generate_labels_relaxed(&jobs(), &["python", "django"], 2).unwrap();
        assert_eq!(set.threshold, 2);
    }

    #[test]
    fn test_single_class_is_error() {
        let jobs = vec![
            JobRecord::new(1, "a", "").with_skills(["java"]),
            JobRecord::new(2, "b", "").with_skills(["cobol"]),
        ];
        let err = generate_labels_relaxed(&jobs, DEFAULT_REFERENCE_SKILLS, 2).unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient(_)));
    }
}
