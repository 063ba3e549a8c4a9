//! Feature transformer
//!
//! `[tf-idf(description)] ++ [1.0 if skill present else 0.0 for skill in vocabulary]`

use crate::job::{normalize_skill, JobRecord};
use crate::{FeatureVector, SkillVocabulary, TfidfVectorizer};
use ahash::AHashSet;

/// Total vector length for a featurizer/vocabulary pair
#[inline]
#[must_use]
pub fn feature_dim(tfidf: &TfidfVectorizer, vocab: &SkillVocabulary) -> usize {
    tfidf.feature_count() + vocab.len()
}

/// Build the feature vector for a description and its skill list
pub fn transform<S: AsRef<str>>(
    text: &str,
    skills: &[S],
    tfidf: &TfidfVectorizer,
    vocab: &SkillVocabulary,
) -> FeatureVector {
    tfidf.transform(text).concat(&skill_indicators(skills, vocab))
}

/// Feature vector for a stored job
pub fn transform_job(
    job: &JobRecord,
    tfidf: &TfidfVectorizer,
    vocab: &SkillVocabulary,
) -> FeatureVector {
    transform(&job.description, &job.required_skills, tfidf, vocab)
}

/// User-side vector: there is no free text, so the tf-idf part is all zeros
pub fn transform_user<S: AsRef<str>>(
    skills: &[S],
    tfidf: &TfidfVectorizer,
    vocab: &SkillVocabulary,
) -> FeatureVector {
    transform("", skills, tfidf, vocab)
}

/// Feature matrix, one row per job, in input order
pub fn transform_batch(
    jobs: &[JobRecord],
    tfidf: &TfidfVectorizer,
    vocab: &SkillVocabulary,
) -> Vec<FeatureVector> {
    jobs.iter().map(|job| transform_job(job, tfidf, vocab)).collect()
}

fn skill_indicators<S: AsRef<str>>(skills: &[S], vocab: &SkillVocabulary) -> FeatureVector {
    let present: AHashSet<String> = skills
        .iter()
        .filter_map(|s| normalize_skill(s.as_ref()))
        .collect();

    vocab
        .iter()
        .map(|skill| if present.contains(skill) { 1.0 } else { 0.0 })
        .collect::<Vec<f64>>()
        .into()
}
