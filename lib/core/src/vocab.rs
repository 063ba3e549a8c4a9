//! Skill vocabulary
//!
//! The sorted set of skill tokens that defines the binary half of every
//! feature vector. Positions must not move between training and inference,
//! so the vocabulary is always sorted and persisted next to the model.

use crate::job::{normalize_skill, JobRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reference technology terms seeded into every vocabulary
pub const COMMON_SKILLS: &[&str] = &[
    "python",
    "javascript",
    "java",
    "c++",
    "c#",
    "php",
    "ruby",
    "go",
    "rust",
    "kotlin",
    "swift",
    "typescript",
    "node.js",
    "nodejs",
    "html",
    "css",
    "react",
    "angular",
    "vue",
    "django",
    "flask",
    "spring",
    "express",
    "next.js",
    "nuxt",
    "svelte",
    "mysql",
    "postgresql",
    "mongodb",
    "sql",
    "nosql",
    "redis",
    "oracle",
    "postgres",
    "sqlite",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "jenkins",
    "ci/cd",
    "terraform",
    "ansible",
    "linux",
    "machine learning",
    "deep learning",
    "tensorflow",
    "pytorch",
    "pandas",
    "numpy",
    "scikit-learn",
    "flutter",
    "react native",
    "android",
    "ios",
    "git",
    "api",
    "rest",
    "graphql",
    "microservices",
    "agile",
    "scrum",
];

/// Ordered, duplicate-free set of lowercase skills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillVocabulary {
    skills: Vec<String>,
}

impl SkillVocabulary {
    /// Union of every job's required skills and [`COMMON_SKILLS`]
    pub fn build<'a, I>(jobs: I) -> Self
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for job in jobs {
            seen.extend(job.normalized_skills());
        }
        seen.extend(COMMON_SKILLS.iter().map(|s| s.to_string()));
        Self {
            skills: seen.into_iter().collect(),
        }
    }

    /// Build from arbitrary strings; they are normalized, deduplicated and sorted.
    pub fn from_skills<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = skills
            .into_iter()
            .filter_map(|s| normalize_skill(s.as_ref()))
            .collect();
        Self {
            skills: set.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.skills
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, skill: &str) -> bool {
        self.index_of(skill).is_some()
    }

    /// Position of a skill in the binary part of the feature vector
    #[must_use]
    pub fn index_of(&self, skill: &str) -> Option<usize> {
        let key = normalize_skill(skill)?;
        self.skills.binary_search(&key).ok()
    }

    /// Loaded vocabularies must still be sorted and unique, otherwise the
    /// feature positions no longer mean what the model was trained on.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.skills.windows(2).all(|w| w[0] < w[1])
    }
}
