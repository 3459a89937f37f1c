//! Assessment reports and ranking results.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::profile::{CandidateId, JobId};

// ─── Recommendation ──────────────────────────────────────────────────────────

/// Hiring recommendation attached to every report.
///
/// Parsing is case-insensitive and also accepts the older three-tier labels
/// ("Highly Recommended", "Recommended", "Not Recommended").
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Recommendation {
  #[serde(rename = "Strong Interview")]
  #[strum(to_string = "Strong Interview", serialize = "Highly Recommended")]
  StrongInterview,
  #[serde(rename = "Interview")]
  #[strum(to_string = "Interview", serialize = "Recommended")]
  Interview,
  #[serde(rename = "Maybe")]
  #[strum(to_string = "Maybe")]
  Maybe,
  #[serde(rename = "Reject")]
  #[strum(to_string = "Reject", serialize = "Not Recommended")]
  Reject,
}

impl Recommendation {
  /// Score bands: ≥85 strong interview, ≥70 interview, ≥55 maybe.
  pub fn from_score(score: f64) -> Self {
    if score >= 85.0 {
      Self::StrongInterview
    } else if score >= 70.0 {
      Self::Interview
    } else if score >= 55.0 {
      Self::Maybe
    } else {
      Self::Reject
    }
  }

  /// Parse a generator-supplied label, falling back to the score band when
  /// the label is not recognised.
  pub fn parse_or_score(label: &str, score: f64) -> Self {
    label
      .trim()
      .parse()
      .unwrap_or_else(|_| Self::from_score(score))
  }
}

/// Whether the report's prose came from the narrative generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStatus {
  Generated,
  /// Generator failed or timed out; prose is a score-based placeholder.
  Unavailable,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// The persisted evaluation of one candidate against one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
  pub report_id:                 Uuid,
  pub job_id:                    JobId,
  pub candidate_id:              CandidateId,
  pub candidate_name:            Option<String>,
  pub overall_score:             f64,
  pub skill_match_score:         f64,
  pub experience_match_score:    Option<f64>,
  pub semantic_similarity_score: Option<f64>,
  pub matched_skills:            Vec<String>,
  pub missing_skills:            Vec<String>,
  pub extra_skills:              Vec<String>,
  pub strengths:                 Vec<String>,
  pub weaknesses:                Vec<String>,
  pub reasoning:                 String,
  pub recommendation:            Recommendation,
  pub narrative_status:          NarrativeStatus,
  /// Content hashes of the profiles this report was computed from.
  pub job_fingerprint:           String,
  pub candidate_fingerprint:     String,
  pub created_at:                DateTime<Utc>,
}

/// Ranking order: overall score descending, then candidate id ascending.
pub fn ranking_order(a: &AssessmentReport, b: &AssessmentReport) -> Ordering {
  b.overall_score
    .total_cmp(&a.overall_score)
    .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

pub fn sort_ranked(reports: &mut [AssessmentReport]) { reports.sort_by(ranking_order); }

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// A candidate left out of a ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCandidate {
  pub candidate_id: CandidateId,
  pub reason:       String,
}

/// Ordered assessments for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
  pub job_id:           JobId,
  pub job_title:        String,
  /// Number of candidates ranked (`rankings.len()`).
  pub total_candidates: usize,
  pub rankings:         Vec<AssessmentReport>,
  /// Comparative summary of the top candidates; absent when the pool was
  /// empty or the generator failed.
  pub summary:          Option<String>,
  #[serde(default)]
  pub skipped:          Vec<SkippedCandidate>,
  pub generated_at:     DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn report(candidate: &str, score: f64) -> AssessmentReport {
    AssessmentReport {
      report_id:                 Uuid::new_v4(),
      job_id:                    JobId::from("JOB-1"),
      candidate_id:              CandidateId::from(candidate),
      candidate_name:            None,
      overall_score:             score,
      skill_match_score:         score,
      experience_match_score:    None,
      semantic_similarity_score: None,
      matched_skills:            vec![],
      missing_skills:            vec![],
      extra_skills:              vec![],
      strengths:                 vec![],
      weaknesses:                vec![],
      reasoning:                 String::new(),
      recommendation:            Recommendation::from_score(score),
      narrative_status:          NarrativeStatus::Generated,
      job_fingerprint:           String::new(),
      candidate_fingerprint:     String::new(),
      created_at:                Utc::now(),
    }
  }

  #[test]
  fn bands() {
    assert_eq!(Recommendation::from_score(85.0), Recommendation::StrongInterview);
    assert_eq!(Recommendation::from_score(84.99), Recommendation::Interview);
    assert_eq!(Recommendation::from_score(70.0), Recommendation::Interview);
    assert_eq!(Recommendation::from_score(55.0), Recommendation::Maybe);
    assert_eq!(Recommendation::from_score(54.99), Recommendation::Reject);
  }

  #[test]
  fn labels_parse_case_insensitively_with_legacy_names() {
    assert_eq!(
      Recommendation::parse_or_score("strong interview", 0.0),
      Recommendation::StrongInterview
    );
    assert_eq!(
      Recommendation::parse_or_score("Highly Recommended", 0.0),
      Recommendation::StrongInterview
    );
    assert_eq!(
      Recommendation::parse_or_score(" Not Recommended ", 99.0),
      Recommendation::Reject
    );
    assert_eq!(Recommendation::parse_or_score("hire!", 72.0), Recommendation::Interview);
  }

  #[test]
  fn display_and_serde_agree() {
    let r = Recommendation::StrongInterview;
    assert_eq!(r.to_string(), "Strong Interview");
    assert_eq!(serde_json::to_string(&r).unwrap(), "\"Strong Interview\"");
  }

  #[test]
  fn ties_break_on_candidate_id() {
    let mut reports = vec![report("CAND-C", 70.0), report("CAND-A", 70.0), report("CAND-B", 90.0)];
    sort_ranked(&mut reports);
    let order: Vec<_> = reports.iter().map(|r| r.candidate_id.as_str()).collect();
    assert_eq!(order, ["CAND-B", "CAND-A", "CAND-C"]);
  }
}
