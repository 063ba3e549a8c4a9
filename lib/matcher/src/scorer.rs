//! Online job scorer
//!
//! One scoring mode is chosen per call:
//!
//! - **Classifier**: the trained bundle loaded and consistent; every candidate
//!   is scored `100 * P(good match)` and kept.
//! - **Heuristic**: no usable bundle; score is `2 * exact + soft` skill hits
//!   and candidates scoring 0 are dropped.
//!
//! Artifact problems never reach the caller, they only select the heuristic.

use crate::config::MatcherConfig;
use jobmatch_core::{normalize_skill, JobRecord, Result, TrainedArtifacts};
use jobmatch_storage::ArtifactProvider;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const EXACT_MATCH_WEIGHT: f64 = 2.0;
const SOFT_MATCH_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Classifier,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub job: JobRecord,
    pub score: f64,
    /// User skills listed in the job's required skills, sorted
    pub matched_skills: Vec<String>,
    /// User skills only found in the title/description text, in user order
    pub soft_matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub mode: ScoringMode,
    pub user_skills: Vec<String>,
    pub matches: Vec<MatchResult>,
}

impl Recommendations {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

enum Strategy {
    Classifier(Arc<TrainedArtifacts>),
    Heuristic,
}

pub struct JobMatcher {
    provider: Option<Arc<dyn ArtifactProvider>>,
    config: MatcherConfig,
}

impl JobMatcher {
    pub fn new(provider: Arc<dyn ArtifactProvider>, config: MatcherConfig) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// A matcher that never consults a model
    pub fn heuristic_only(config: MatcherConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Rank `jobs` for a user's skills; never fails, worst case is empty
    pub fn score_jobs<S: AsRef<str>>(
        &self,
        user_skills: &[S],
        jobs: &[JobRecord],
    ) -> Recommendations {
        let user_skills = normalize_user_skills(user_skills);
        if user_skills.is_empty() {
            debug!("No usable user skills; nothing to recommend");
            return Recommendations {
                mode: ScoringMode::Heuristic,
                user_skills,
                matches: Vec::new(),
            };
        }

        let candidates = select_candidates(&user_skills, jobs, self.config.max_candidates);

        let (mode, mut matches) = match self.select_strategy() {
            Strategy::Classifier(artifacts) => {
                match classifier_scores(&artifacts, &user_skills, &candidates) {
                    Ok(matches) => (ScoringMode::Classifier, matches),
                    Err(e) => {
                        warn!("Classifier scoring failed, using heuristic: {}", e);
                        (
                            ScoringMode::Heuristic,
                            heuristic_scores(&user_skills, &candidates),
                        )
                    }
                }
            }
            Strategy::Heuristic => (
                ScoringMode::Heuristic,
                heuristic_scores(&user_skills, &candidates),
            ),
        };

        rank(&mut matches, self.config.top_n);
        info!(
            "Scored {} candidates in {:?} mode, returning {}",
            candidates.len(),
            mode,
            matches.len()
        );

        Recommendations {
            mode,
            user_skills,
            matches,
        }
    }

    fn select_strategy(&self) -> Strategy {
        let Some(provider) = &self.provider else {
            return Strategy::Heuristic;
        };
        match provider.artifacts() {
            Ok(artifacts) => Strategy::Classifier(artifacts),
            Err(e) if e.is_artifact_error() => {
                debug!("No usable model bundle: {}", e);
                Strategy::Heuristic
            }
            Err(e) => {
                warn!("Loading model bundle failed: {}", e);
                Strategy::Heuristic
            }
        }
    }
}

/// Trim, lowercase, drop blanks and repeated skills (first occurrence wins)
pub fn normalize_user_skills<S: AsRef<str>>(skills: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .filter_map(|s| normalize_skill(s.as_ref()))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Active jobs whose title or description mentions any user skill, in input
/// order, one per job id, at most `cap`
pub fn select_candidates<'a>(
    user_skills: &[String],
    jobs: &'a [JobRecord],
    cap: usize,
) -> Vec<&'a JobRecord> {
    let mut seen = HashSet::new();
    jobs.iter()
        .filter(|job| job.is_active())
        .filter(|job| {
            let text = job.search_text();
            user_skills.iter().any(|s| text.contains(s.as_str()))
        })
        .filter(|job| seen.insert(job.id))
        .take(cap)
        .collect()
}

/// Exact matches (sorted) and soft text matches (user order) for one job
pub fn skill_matches(user_skills: &[String], job: &JobRecord) -> (Vec<String>, Vec<String>) {
    let job_skills: HashSet<String> = job.normalized_skills().collect();

    let mut matched: Vec<String> = user_skills
        .iter()
        .filter(|s| job_skills.contains(*s))
        .cloned()
        .collect();
    matched.sort();
    matched.dedup();

    let text = job.search_text();
    let soft = user_skills
        .iter()
        .filter(|s| !matched.contains(s) && text.contains(s.as_str()))
        .cloned()
        .collect();

    (matched, soft)
}

#[inline]
#[must_use]
pub fn heuristic_score(exact: usize, soft: usize) -> f64 {
    EXACT_MATCH_WEIGHT * exact as f64 + SOFT_MATCH_WEIGHT * soft as f64
}

fn heuristic_scores(user_skills: &[String], candidates: &[&JobRecord]) -> Vec<MatchResult> {
    candidates
        .iter()
        .filter_map(|&job| {
            let (matched_skills, soft_matches) = skill_matches(user_skills, job);
            let score = heuristic_score(matched_skills.len(), soft_matches.len());
            (score > 0.0).then(|| MatchResult {
                job: job.clone(),
                score,
                matched_skills,
                soft_matches,
            })
        })
        .collect()
}

fn classifier_scores(
    artifacts: &TrainedArtifacts,
    user_skills: &[String],
    candidates: &[&JobRecord],
) -> Result<Vec<MatchResult>> {
    candidates
        .iter()
        .map(|&job| {
            let probability = artifacts.score(job)?;
            let (matched_skills, soft_matches) = skill_matches(user_skills, job);
            Ok(MatchResult {
                job: job.clone(),
                score: round2(probability * 100.0),
                matched_skills,
                soft_matches,
            })
        })
        .collect()
}

/// Score descending, then job id ascending; keep the first `top_n`
fn rank(matches: &mut Vec<MatchResult>, top_n: usize) {
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.job.id.cmp(&b.job.id))
    });
    matches.truncate(top_n);
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::Error;

    struct FailingProvider;

    impl ArtifactProvider for FailingProvider {
        fn artifacts(&self) -> Result<Arc<TrainedArtifacts>> {
            Err(Error::ArtifactCorrupt("truncated".into()))
        }
    }

    fn jobs() -> Vec<JobRecord> {
        vec![
            JobRecord::new(1, "Backend Developer", "We build services in python and django")
                .with_skills(["Python", "Django"]),
            JobRecord::new(2, "Data Analyst", "Reporting with SQL and Excel")
                .with_skills(["excel"]),
            JobRecord::new(3, "Chef", "Cook tasty food").with_skills(["cooking"]),
        ]
    }

    #[test]
    fn test_heuristic_end_to_end() {
        let matcher = JobMatcher::heuristic_only(MatcherConfig::default());
        let recs = matcher.score_jobs(&["python", "django", "sql"], &jobs());

        assert_eq!(recs.mode, ScoringMode::Heuristic);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs.matches[0].job.id, 1);
        assert_eq!(recs.matches[0].score, 4.0);
        assert_eq!(recs.matches[0].matched_skills, vec!["django", "python"]);
        assert!(recs.matches[0].soft_matches.is_empty());
        assert_eq!(recs.matches[1].job.id, 2);
        assert_eq!(recs.matches[1].score, 1.0);
        assert_eq!(recs.matches[1].soft_matches, vec!["sql"]);
    }

    #[test]
    fn test_failing_provider_falls_back() {
        let matcher = JobMatcher::new(Arc::new(FailingProvider), MatcherConfig::default());
        let recs = matcher.score_jobs(&["python"], &jobs());
        assert_eq!(recs.mode, ScoringMode::Heuristic);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn test_user_skill_normalization() {
        let skills = normalize_user_skills(&[" Python", "", "python", "SQL ", "   "]);
        assert_eq!(skills, vec!["python", "sql"]);
    }

    #[test]
    fn test_no_skills_returns_empty() {
        let matcher = JobMatcher::heuristic_only(MatcherConfig::default());
        let recs = matcher.score_jobs::<&str>(&[], &jobs());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_candidates_skip_inactive_and_duplicates() {
        let mut all = jobs();
        all.push(all[0].clone());
        all[1].set_active(false);

        let skills = vec!["python".to_string(), "sql".to_string()];
        let candidates = select_candidates(&skills, &all, 200);
        let ids: Vec<u64> = candidates.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_candidate_cap() {
        let many: Vec<JobRecord> = (0..10)
            .map(|i| JobRecord::new(i, "Rust engineer", "rust"))
            .collect();
        let skills = vec!["rust".to_string()];
        assert_eq!(select_candidates(&skills, &many, 3).len(), 3);
    }

    #[test]
    fn test_ties_break_on_job_id() {
        let many: Vec<JobRecord> = [5u64, 3, 9, 1]
            .iter()
            .map(|&i| JobRecord::new(i, "Go developer", "go services").with_skills(["go"]))
            .collect();
        let config = MatcherConfig {
            top_n: 3,
            ..Default::default()
        };
        let recs = JobMatcher::heuristic_only(config).score_jobs(&["go"], &many);
        let ids: Vec<u64> = recs.matches.iter().map(|m| m.job.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_exact_match_without_text_mention() {
        // pre-filter passes on "java" in the title; "kotlin" only in required skills
        let job = JobRecord::new(1, "Java developer", "").with_skills(["kotlin", "java"]);
        let skills = vec!["kotlin".to_string(), "java".to_string()];
        let (matched, soft) = skill_matches(&skills, &job);
        assert_eq!(matched, vec!["java", "kotlin"]);
        assert!(soft.is_empty());
        assert_eq!(heuristic_score(matched.len(), soft.len()), 4.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(100.0), 100.0);
    }
}
