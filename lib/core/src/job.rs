use serde::{Deserialize, Serialize};

/// A job posting as supplied by the surrounding application
///
/// Records are immutable once imported; only the active flag may be toggled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default = "default_currency")]
    pub salary_currency: String,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_active() -> bool {
    true
}

impl JobRecord {
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            company: String::new(),
            location: String::new(),
            description: description.into(),
            required_skills: Vec::new(),
            experience_level: String::new(),
            job_type: String::new(),
            salary_min: None,
            salary_max: None,
            salary_currency: default_currency(),
            is_active: true,
        }
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Required skills trimmed and lowercased, blanks dropped
    pub fn normalized_skills(&self) -> impl Iterator<Item = String> + '_ {
        self.required_skills.iter().filter_map(|s| normalize_skill(s))
    }

    /// Lowercased `title + " " + description`, the text soft matches search
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }

    #[must_use]
    pub fn salary_range(&self) -> String {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) if min > 0 && max > 0 => format!(
                "{} {} - {}",
                self.salary_currency,
                group_thousands(min),
                group_thousands(max)
            ),
            (Some(min), _) if min > 0 => {
                format!("{} {}+", self.salary_currency, group_thousands(min))
            }
            _ => "Not specified".to_string(),
        }
    }
}

impl std::fmt::Display for JobRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.title, self.company)
    }
}

/// Trim and lowercase a skill; `None` when nothing is left
#[inline]
#[must_use]
pub fn normalize_skill(skill: &str) -> Option<String> {
    let s = skill.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_lowercase())
    }
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_range() {
        let mut job = JobRecord::new(1, "Backend Engineer", "");
        assert_eq!(job.salary_range(), "Not specified");

        job.salary_min = Some(50_000);
        assert_eq!(job.salary_range(), "USD 50,000+");

        job.salary_max = Some(1_250_000);
        assert_eq!(job.salary_range(), "USD 50,000 - 1,250,000");
    }

    #[test]
    fn test_normalized_skills() {
        let job = JobRecord::new(1, "Dev", "").with_skills(["  Python ", "", "DJANGO", "   "]);
        let skills: Vec<String> = job.normalized_skills().collect();
        assert_eq!(skills, vec!["python", "django"]);
    }

    #[test]
    fn test_deserialize_defaults() {
        let job: JobRecord = serde_json::from_str(r#"{"id": 7, "title": "SRE"}"#).unwrap();
        assert!(job.is_active());
        assert!(job.description.is_empty());
        assert!(job.required_skills.is_empty());
        assert_eq!(job.salary_currency, "USD");
    }

    #[test]
    fn test_activation_toggle() {
        let mut job = JobRecord::new(1, "Dev", "");
        job.set_active(false);
        assert!(!job.is_active());
        assert_eq!(job.to_string(), "Dev at ");
    }
}
