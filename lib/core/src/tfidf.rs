//! TF-IDF text featurizer
//!
//! Bag of word n-grams weighted by smoothed inverse document frequency and
//! L2 normalized per document. The vectorizer is fit once per training run
//! and only ever used in transform mode afterwards; its term list fixes the
//! first `feature_count()` positions of every feature vector.

use crate::{Error, FeatureVector, Result};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fitting parameters for [`TfidfVectorizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Keep only the most frequent terms across the corpus
    pub max_features: Option<usize>,
    /// Inclusive (min, max) n-gram lengths
    pub ngram_range: (usize, usize),
    /// Drop English stop words before forming n-grams
    pub stop_words: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features: Some(5000),
            ngram_range: (1, 2),
            stop_words: true,
        }
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::InvalidConfig(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if self.max_features == Some(0) {
            return Err(Error::InvalidConfig("max_features must be positive".into()));
        }
        Ok(())
    }
}

/// Persisted form; the term index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct TfidfState {
    config: TfidfConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
    n_docs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TfidfState", into = "TfidfState")]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    // sorted; position == feature index
    terms: Vec<String>,
    idf: Vec<f64>,
    index: AHashMap<String, usize>,
    n_docs: usize,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and idf weights from a corpus
    pub fn fit<S: AsRef<str>>(config: TfidfConfig, docs: &[S]) -> Result<Self> {
        config.validate()?;

        // term -> corpus count, term -> document frequency
        let mut term_counts: AHashMap<String, u64> = AHashMap::new();
        let mut doc_freqs: AHashMap<String, u64> = AHashMap::new();

        for doc in docs {
            let mut seen: AHashSet<String> = AHashSet::new();
            for gram in analyze(&config, doc.as_ref()) {
                *term_counts.entry(gram.clone()).or_insert(0) += 1;
                if !seen.contains(&gram) {
                    *doc_freqs.entry(gram.clone()).or_insert(0) += 1;
                    seen.insert(gram);
                }
            }
        }

        if term_counts.is_empty() {
            return Err(Error::EmptyVocabulary(format!(
                "{} documents contain no terms after stop-word removal",
                docs.len()
            )));
        }

        let mut ranked: Vec<(String, u64)> = term_counts.into_iter().collect();
        if let Some(max) = config.max_features {
            if ranked.len() > max {
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                ranked.truncate(max);
            }
        }

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n = docs.len() as f64;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freqs.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        Ok(Self::from(TfidfState {
            config,
            terms,
            idf,
            n_docs: docs.len(),
        }))
    }

    /// Weight a document against the fitted vocabulary
    ///
    /// Empty text yields the zero vector; the length is always
    /// [`feature_count`](Self::feature_count).
    #[must_use]
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut vector = FeatureVector::zeros(self.terms.len());
        if text.trim().is_empty() {
            return vector;
        }

        let weights = vector.as_mut_slice();
        for gram in analyze(&self.config, text) {
            if let Some(&idx) = self.index.get(&gram) {
                weights[idx] += 1.0;
            }
        }
        for (w, idf) in weights.iter_mut().zip(&self.idf) {
            *w *= idf;
        }

        vector.normalize();
        vector
    }

    #[inline]
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    /// Consistency check for vectorizers read back from disk
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.config.validate().is_ok()
            && self.terms.len() == self.idf.len()
            && self.index.len() == self.terms.len()
            && self.idf.iter().all(|w| w.is_finite() && *w >= 1.0)
    }
}

impl PartialEq for TfidfVectorizer {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && self.terms == other.terms
            && self.idf == other.idf
            && self.n_docs == other.n_docs
    }
}

impl From<TfidfState> for TfidfVectorizer {
    fn from(state: TfidfState) -> Self {
        let index = state
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self {
            config: state.config,
            terms: state.terms,
            idf: state.idf,
            index,
            n_docs: state.n_docs,
        }
    }
}

impl From<TfidfVectorizer> for TfidfState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            config: v.config,
            terms: v.terms,
            idf: v.idf,
            n_docs: v.n_docs,
        }
    }
}

/// Split text into lowercase word tokens of at least two characters
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Tokens -> stop-word filter -> n-grams
fn analyze(config: &TfidfConfig, text: &str) -> Vec<String> {
    let mut tokens = tokenize(text);
    if config.stop_words {
        tokens.retain(|t| !is_stop_word(t));
    }

    let (min_n, max_n) = config.ngram_range;
    if min_n == 1 && max_n == 1 {
        return tokens;
    }

    let mut grams = Vec::with_capacity(tokens.len() * (max_n - min_n + 1));
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    grams
}

#[must_use]
pub fn is_stop_word(token: &str) -> bool {
    static STOP_WORDS: OnceLock<AHashSet<&'static str>> = OnceLock::new();
    STOP_WORDS
        .get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
        .contains(token)
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "bottom", "but", "by", "can", "cannot", "could", "do", "done", "down",
    "due", "during", "each", "eg", "eight", "either", "else", "elsewhere", "enough", "etc",
    "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few", "first",
    "for", "former", "formerly", "from", "front", "full", "further", "get", "give", "go", "had",
    "has", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "ie", "if", "in", "indeed",
    "into", "is", "it", "its", "itself", "just", "keep", "last", "latter", "least", "less",
    "made", "many", "may", "me", "meanwhile", "might", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "namely", "neither", "never", "nevertheless",
    "next", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "several", "she",
    "should", "show", "side", "since", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "take", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards", "under",
    "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];
