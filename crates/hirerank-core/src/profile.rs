//! Job and candidate profiles: the structured inputs to scoring.
//!
//! Profiles are produced by an upstream extraction step and consumed
//! read-only here. Optional inputs (embeddings, experience figures) are
//! explicit `Option`s; the scoring function documents how each absence is
//! handled.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Identifier of a job profile, e.g. `"JOB-2024-001"`.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for JobId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for JobId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Identifier of a candidate profile, e.g. `"CAND-001"`.
///
/// Ordering is plain lexicographic; rankings use it as the tie-breaker.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CandidateId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for CandidateId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Job ─────────────────────────────────────────────────────────────────────

/// The experience a job asks for.
///
/// Upstream extraction sometimes yields numbers and sometimes only the
/// original phrase ("3-5 years"); both are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRequirement {
  pub min_years: Option<f64>,
  pub max_years: Option<f64>,
  /// The requirement as written in the job description.
  pub text:      Option<String>,
}

impl ExperienceRequirement {
  /// `(min, max)` years. Both come from the numeric fields when either is
  /// set, otherwise both are parsed from `text`. A maximum below the minimum
  /// is raised to it.
  pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
    let (min, max) = if self.min_years.is_some() || self.max_years.is_some() {
      (self.min_years, self.max_years)
    } else {
      self.text.as_deref().map_or((None, None), parse_years)
    };
    match (min, max) {
      (Some(lo), Some(hi)) if hi < lo => (Some(lo), Some(lo)),
      bounds => bounds,
    }
  }

  pub fn minimum(&self) -> Option<f64> { self.bounds().0 }

  pub fn maximum(&self) -> Option<f64> { self.bounds().1 }
}

/// Parse a free-text experience phrase into `(min, max)` years.
///
/// `"3-5 years"` → `(3, 5)`, `"3+ years"` → `(3, None)`, `"at least 2 years"`
/// → `(2, None)`, `"up to 4 years"` → `(None, 4)`. Text without digits yields
/// `(None, None)`.
pub fn parse_years(text: &str) -> (Option<f64>, Option<f64>) {
  let lower = text.to_lowercase();
  let numbers: Vec<f64> = lower
    .split(|c: char| !(c.is_ascii_digit() || c == '.'))
    .map(|t| t.trim_matches('.'))
    .filter(|t| !t.is_empty())
    .filter_map(|t| t.parse().ok())
    .collect();

  let upper_bound_only = ["up to", "at most", "maximum", "less than", "under"]
    .iter()
    .any(|p| lower.contains(p));

  match numbers.as_slice() {
    [] => (None, None),
    [only] if upper_bound_only => (None, Some(*only)),
    [only] => (Some(*only), None),
    [a, b, ..] => (Some(a.min(*b)), Some(a.max(*b))),
  }
}

/// A structured job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
  pub id:               JobId,
  pub title:            String,
  /// Seniority level, e.g. "Junior", "Mid", "Senior", "Lead".
  pub seniority:        Option<String>,
  /// Must-have skills, in the order the description lists them.
  #[serde(default)]
  pub required_skills:  Vec<String>,
  /// Nice-to-have skills.
  #[serde(default)]
  pub preferred_skills: Vec<String>,
  #[serde(default)]
  pub experience:       ExperienceRequirement,
  /// Industry or domain tag, e.g. "Fintech".
  pub domain:           Option<String>,
  pub summary:          Option<String>,
  #[serde(default)]
  pub responsibilities: Vec<String>,
  pub embedding:        Option<Vec<f32>>,
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// One work-history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
  pub company:     Option<String>,
  pub role:        Option<String>,
  pub years:       Option<f64>,
  pub description: Option<String>,
  #[serde(default)]
  pub skills_used: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
  pub institution:    Option<String>,
  pub degree:         Option<String>,
  pub field_of_study: Option<String>,
  pub year:           Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
  pub name:         Option<String>,
  pub description:  Option<String>,
  #[serde(default)]
  pub technologies: Vec<String>,
  pub url:          Option<String>,
}

/// External profile links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLinks {
  pub github:    Option<String>,
  pub linkedin:  Option<String>,
  pub portfolio: Option<String>,
}

/// A structured resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
  pub id:                     CandidateId,
  pub name:                   Option<String>,
  pub email:                  Option<String>,
  pub headline:               Option<String>,
  #[serde(default)]
  pub skills:                 Vec<String>,
  #[serde(default)]
  pub experience:             Vec<ExperienceEntry>,
  #[serde(default)]
  pub education:              Vec<EducationEntry>,
  #[serde(default)]
  pub projects:               Vec<ProjectEntry>,
  /// Overrides the sum of `experience[].years` when set.
  pub total_experience_years: Option<f64>,
  pub summary:                Option<String>,
  #[serde(default)]
  pub links:                  ProfileLinks,
  pub embedding:              Option<Vec<f32>>,
  /// The job this candidate applied to directly, if any.
  pub job_id:                 Option<JobId>,
}

impl CandidateProfile {
  /// Total years of experience: the explicit total if present, otherwise the
  /// sum over entries that carry a figure. `None` when nothing is known.
  pub fn years_of_experience(&self) -> Option<f64> {
    if let Some(total) = self.total_experience_years {
      return Some(total);
    }
    let mut known = self.experience.iter().filter_map(|e| e.years).peekable();
    known.peek()?;
    Some(known.sum())
  }

  /// Name for display, falling back to the identifier.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(self.id.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(total: Option<f64>, entries: &[Option<f64>]) -> CandidateProfile {
    CandidateProfile {
      id:                     CandidateId::from("CAND-1"),
      name:                   None,
      email:                  None,
      headline:               None,
      skills:                 vec![],
      experience:             entries
        .iter()
        .map(|years| ExperienceEntry { years: *years, ..Default::default() })
        .collect(),
      education:              vec![],
      projects:               vec![],
      total_experience_years: total,
      summary:                None,
      links:                  ProfileLinks::default(),
      embedding:              None,
      job_id:                 None,
    }
  }

  #[test]
  fn parse_years_handles_common_phrasings() {
    assert_eq!(parse_years("3-5 years"), (Some(3.0), Some(5.0)));
    assert_eq!(parse_years("3+ years"), (Some(3.0), None));
    assert_eq!(parse_years("At least 2.5 years"), (Some(2.5), None));
    assert_eq!(parse_years("up to 4 years"), (None, Some(4.0)));
    assert_eq!(parse_years("5 to 2 years"), (Some(2.0), Some(5.0)));
    assert_eq!(parse_years("senior"), (None, None));
  }

  #[test]
  fn explicit_minimum_wins_over_text() {
    let req = ExperienceRequirement {
      min_years: Some(4.0),
      max_years: None,
      text:      Some("2-3 years".into()),
    };
    assert_eq!(req.bounds(), (Some(4.0), None));
  }

  #[test]
  fn text_supplies_both_bounds_when_no_figures() {
    let req = ExperienceRequirement { text: Some("2-3 years".into()), ..Default::default() };
    assert_eq!(req.bounds(), (Some(2.0), Some(3.0)));
  }

  #[test]
  fn inverted_explicit_range_is_clamped() {
    let req = ExperienceRequirement {
      min_years: Some(5.0),
      max_years: Some(3.0),
      text:      None,
    };
    assert_eq!(req.bounds(), (Some(5.0), Some(5.0)));
  }

  #[test]
  fn years_prefers_explicit_total() {
    assert_eq!(candidate(Some(2.5), &[Some(10.0)]).years_of_experience(), Some(2.5));
  }

  #[test]
  fn years_sums_known_entries() {
    assert_eq!(
      candidate(None, &[Some(1.5), None, Some(2.0)]).years_of_experience(),
      Some(3.5)
    );
  }

  #[test]
  fn years_unknown_without_figures() {
    assert_eq!(candidate(None, &[None, None]).years_of_experience(), None);
    assert_eq!(candidate(None, &[]).years_of_experience(), None);
  }
}
