//! The scoring function: deterministic sub-scores and a weighted overall
//! score for one (job, candidate) pair.
//!
//! All scores are on a 0–100 scale and rounded to two decimals.
//!
//! # Sub-scores
//!
//! - **Skill match**: share of the job's required skills the candidate has.
//!   A job with no required skills scores 100.
//! - **Experience match**: with stated minimum `m` and floor fraction `f`:
//!   100 at or above `m`, 0 at or below `f·m`, linear in between. Absent when
//!   the job states no minimum or the candidate's years are unknown.
//! - **Semantic similarity**: cosine similarity of the two embeddings mapped
//!   from [-1, 1] to [0, 100]. Absent when either embedding is missing, the
//!   dimensions differ, or a vector has zero norm.
//!
//! The overall score is the weighted mean of the *present* sub-scores: weights
//! of absent sub-scores are dropped and the rest renormalised to sum to 1.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  profile::{CandidateProfile, JobProfile},
  skills::SkillNormalizer,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Relative importance of each sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
  pub semantic_similarity: f64,
  pub skill_match:         f64,
  pub experience_match:    f64,
}

impl Default for Weights {
  fn default() -> Self {
    Self {
      semantic_similarity: 0.40,
      skill_match:         0.35,
      experience_match:    0.25,
    }
  }
}

impl Weights {
  pub fn sum(&self) -> f64 {
    self.semantic_similarity + self.skill_match + self.experience_match
  }

  /// Every weight finite and non-negative, and the skill weight positive.
  ///
  /// Skill match is the one sub-score that is always present, so a positive
  /// skill weight keeps the renormalised denominator above zero.
  pub fn validate(&self) -> Result<()> {
    let all = [
      ("semantic_similarity", self.semantic_similarity),
      ("skill_match", self.skill_match),
      ("experience_match", self.experience_match),
    ];
    for (name, w) in all {
      if !w.is_finite() || w < 0.0 {
        return Err(Error::InvalidWeights(format!("{name} = {w}")));
      }
    }
    if self.skill_match <= 0.0 {
      return Err(Error::InvalidWeights("skill_match must be positive".into()));
    }
    Ok(())
  }
}

/// Tunables for [`Scorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub weights:          Weights,
  /// Fraction of the required minimum at or below which experience earns
  /// zero credit. `0.0` gives a straight line from 0 years to the minimum.
  pub experience_floor: f64,
  /// Cap on the number of extra (unrequested) skills listed in a report.
  pub max_extra_skills: usize,
  /// Site-specific skill aliases, `alias = canonical`.
  pub skill_aliases:    BTreeMap<String, String>,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      weights:          Weights::default(),
      experience_floor: 0.0,
      max_extra_skills: 10,
      skill_aliases:    BTreeMap::new(),
    }
  }
}

impl ScoringConfig {
  pub fn validate(&self) -> Result<()> {
    self.weights.validate()?;
    if !(0.0..1.0).contains(&self.experience_floor) {
      return Err(Error::InvalidExperienceFloor(self.experience_floor));
    }
    Ok(())
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Skill overlap between a job and a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
  pub score:   f64,
  /// Required skills the candidate has, then preferred ones; job spelling.
  pub matched: Vec<String>,
  /// Required skills the candidate lacks; job spelling.
  pub missing: Vec<String>,
  /// Candidate skills the job does not mention; candidate spelling.
  pub extra:   Vec<String>,
}

/// Everything the scoring function derives for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
  pub overall:             f64,
  pub skills:              SkillMatch,
  pub experience_match:    Option<f64>,
  pub semantic_similarity: Option<f64>,
  /// Inputs to the experience sub-score, kept for narrative prompts.
  pub candidate_years:     Option<f64>,
  pub required_years:      Option<f64>,
}

// ─── Scorer ──────────────────────────────────────────────────────────────────

/// Validated scoring configuration plus its skill normaliser.
#[derive(Debug, Clone)]
pub struct Scorer {
  config:     ScoringConfig,
  normalizer: SkillNormalizer,
}

impl Scorer {
  pub fn new(config: ScoringConfig) -> Result<Self> {
    config.validate()?;
    let normalizer = SkillNormalizer::with_aliases(&config.skill_aliases);
    Ok(Self { config, normalizer })
  }

  pub fn config(&self) -> &ScoringConfig { &self.config }

  /// Score `candidate` against `job`. Pure: identical inputs give identical
  /// outputs.
  pub fn score(&self, job: &JobProfile, candidate: &CandidateProfile) -> ScoreBreakdown {
    let skills = self.skill_match(
      &job.required_skills,
      &job.preferred_skills,
      &candidate.skills,
    );

    let candidate_years = candidate.years_of_experience();
    let required_years = job.experience.minimum();
    let experience_match = self.experience_match(candidate_years, required_years);

    let semantic_similarity = match (&job.embedding, &candidate.embedding) {
      (Some(a), Some(b)) => semantic_similarity(a, b),
      _ => None,
    };

    let overall = self.combine(skills.score, experience_match, semantic_similarity);

    ScoreBreakdown {
      overall,
      skills,
      experience_match,
      semantic_similarity,
      candidate_years,
      required_years,
    }
  }

  pub fn skill_match(
    &self,
    required: &[String],
    preferred: &[String],
    candidate: &[String],
  ) -> SkillMatch {
    let n = &self.normalizer;
    let have: HashSet<String> = candidate.iter().map(|s| n.normalize(s)).collect();

    let required = n.dedupe(required);
    let preferred: Vec<_> = n
      .dedupe(preferred)
      .into_iter()
      .filter(|(k, _)| !required.iter().any(|(r, _)| r == k))
      .collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for (key, display) in &required {
      if have.contains(key) {
        matched.push(display.clone());
      } else {
        missing.push(display.clone());
      }
    }
    let required_hits = matched.len();
    matched.extend(
      preferred
        .iter()
        .filter(|(key, _)| have.contains(key))
        .map(|(_, display)| display.clone()),
    );

    let mentioned: HashSet<&str> = required
      .iter()
      .chain(&preferred)
      .map(|(k, _)| k.as_str())
      .collect();
    let extra = n
      .dedupe(candidate)
      .into_iter()
      .filter(|(k, _)| !mentioned.contains(k.as_str()))
      .map(|(_, display)| display)
      .take(self.config.max_extra_skills)
      .collect();

    let score = if required.is_empty() {
      100.0
    } else {
      round2(required_hits as f64 / required.len() as f64 * 100.0)
    };

    SkillMatch { score, matched, missing, extra }
  }

  /// Experience credit for `years` against a stated `minimum`.
  pub fn experience_match(&self, years: Option<f64>, minimum: Option<f64>) -> Option<f64> {
    let (years, minimum) = (years?, minimum?);
    if !years.is_finite() || !minimum.is_finite() {
      return None;
    }
    if minimum <= 0.0 || years >= minimum {
      return Some(100.0);
    }
    let floor = self.config.experience_floor * minimum;
    if years <= floor {
      return Some(0.0);
    }
    Some(round2(100.0 * (years - floor) / (minimum - floor)))
  }

  fn combine(&self, skill: f64, experience: Option<f64>, semantic: Option<f64>) -> f64 {
    let w = &self.config.weights;
    let parts = [
      (Some(skill), w.skill_match),
      (experience, w.experience_match),
      (semantic, w.semantic_similarity),
    ];

    let mut total = 0.0;
    let mut weight = 0.0;
    for (score, w) in parts {
      if let Some(score) = score {
        total += score * w;
        weight += w;
      }
    }

    // `weight >= skill_match > 0` for a validated config.
    round2(total / weight)
  }
}

// ─── Vector similarity ───────────────────────────────────────────────────────

/// Cosine similarity in [-1, 1]. `None` on empty input, dimension mismatch,
/// or a zero-norm vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
  if a.len() != b.len() {
    tracing::warn!(
      a_len = a.len(),
      b_len = b.len(),
      "embedding dimension mismatch; similarity treated as absent"
    );
    return None;
  }
  if a.is_empty() {
    return None;
  }

  let mut dot = 0.0_f64;
  let mut norm_a = 0.0_f64;
  let mut norm_b = 0.0_f64;
  for (x, y) in a.iter().zip(b) {
    let (x, y) = (f64::from(*x), f64::from(*y));
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }

  if norm_a == 0.0 || norm_b == 0.0 {
    return None;
  }
  Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Cosine similarity mapped onto the 0–100 scale.
pub fn semantic_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
  cosine_similarity(a, b).map(|c| round2(((c + 1.0) * 50.0).clamp(0.0, 100.0)))
}

fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

#[cfg(test)]
mod tests {
  use super::*;
  use crate::profile::{CandidateId, ExperienceRequirement, JobId, ProfileLinks};

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
  }

  fn job(required: &[&str], min_years: Option<f64>, embedding: Option<Vec<f32>>) -> JobProfile {
    JobProfile {
      id:               JobId::from("JOB-1"),
      title:            "AI Engineer".into(),
      seniority:        Some("Mid".into()),
      required_skills:  strings(required),
      preferred_skills: vec![],
      experience:       ExperienceRequirement { min_years, max_years: None, text: None },
      domain:           None,
      summary:          None,
      responsibilities: vec![],
      embedding,
    }
  }

  fn candidate(skills: &[&str], years: Option<f64>, embedding: Option<Vec<f32>>) -> CandidateProfile {
    CandidateProfile {
      id:                     CandidateId::from("CAND-1"),
      name:                   Some("Rahul Nair".into()),
      email:                  None,
      headline:               None,
      skills:                 strings(skills),
      experience:             vec![],
      education:              vec![],
      projects:               vec![],
      total_experience_years: years,
      summary:                None,
      links:                  ProfileLinks::default(),
      embedding,
      job_id:                 None,
    }
  }

  fn scorer() -> Scorer { Scorer::new(ScoringConfig::default()).unwrap() }

  // ── Skills ────────────────────────────────────────────────────────────────

  #[test]
  fn partial_skill_overlap_reports_all_three_sets() {
    let m = scorer().skill_match(
      &strings(&["Python", "FastAPI", "LLMs"]),
      &[],
      &strings(&["Python", "Docker", "LangChain"]),
    );
    assert_eq!(m.matched, strings(&["Python"]));
    assert_eq!(m.missing, strings(&["FastAPI", "LLMs"]));
    assert_eq!(m.extra, strings(&["Docker", "LangChain"]));
    assert!((m.score - 33.33).abs() < 0.01, "score = {}", m.score);
  }

  #[test]
  fn superset_scores_full_marks_case_insensitively() {
    let m = scorer().skill_match(
      &strings(&["Python", "FastAPI"]),
      &[],
      &strings(&["fastapi", "PYTHON", "Rust"]),
    );
    assert_eq!(m.score, 100.0);
    assert!(m.missing.is_empty());
  }

  #[test]
  fn disjoint_skills_score_zero() {
    let m = scorer().skill_match(&strings(&["Go", "Kafka"]), &[], &strings(&["Excel"]));
    assert_eq!(m.score, 0.0);
    assert!(m.matched.is_empty());
  }

  #[test]
  fn aliases_count_as_matches() {
    let m = scorer().skill_match(&strings(&["Kubernetes", "JavaScript"]), &[], &strings(&["k8s", "JS"]));
    assert_eq!(m.score, 100.0);
  }

  #[test]
  fn preferred_matches_are_listed_but_not_scored() {
    let m = scorer().skill_match(
      &strings(&["Python"]),
      &strings(&["Docker", "AWS"]),
      &strings(&["Docker"]),
    );
    assert_eq!(m.score, 0.0);
    assert_eq!(m.matched, strings(&["Docker"]));
    assert_eq!(m.missing, strings(&["Python"]));
    assert!(m.extra.is_empty());
  }

  #[test]
  fn no_required_skills_is_full_marks() {
    let m = scorer().skill_match(&[], &[], &strings(&["Python"]));
    assert_eq!(m.score, 100.0);
  }

  #[test]
  fn extra_skills_are_capped() {
    let s = Scorer::new(ScoringConfig { max_extra_skills: 2, ..Default::default() }).unwrap();
    let m = s.skill_match(&[], &[], &strings(&["a", "b", "c", "d"]));
    assert_eq!(m.extra, strings(&["a", "b"]));
  }

  // ── Experience ────────────────────────────────────────────────────────────

  #[test]
  fn experience_below_minimum_is_linear_from_zero() {
    let e = scorer().experience_match(Some(2.5), Some(3.0)).unwrap();
    assert!((e - 83.33).abs() < 0.01, "experience = {e}");
  }

  #[test]
  fn experience_saturates_at_minimum() {
    let s = scorer();
    assert_eq!(s.experience_match(Some(3.0), Some(3.0)), Some(100.0));
    assert_eq!(s.experience_match(Some(12.0), Some(3.0)), Some(100.0));
  }

  #[test]
  fn experience_is_monotonic() {
    let s = Scorer::new(ScoringConfig { experience_floor: 0.25, ..Default::default() }).unwrap();
    let mut last = -1.0;
    for tenth in 0..=80 {
      let years = f64::from(tenth) / 10.0;
      let e = s.experience_match(Some(years), Some(4.0)).unwrap();
      assert!(e >= last, "{years} years scored {e} < {last}");
      last = e;
    }
    assert_eq!(last, 100.0);
  }

  #[test]
  fn experience_floor_zeroes_low_years() {
    let s = Scorer::new(ScoringConfig { experience_floor: 0.5, ..Default::default() }).unwrap();
    assert_eq!(s.experience_match(Some(1.0), Some(4.0)), Some(0.0));
    assert_eq!(s.experience_match(Some(2.0), Some(4.0)), Some(0.0));
    assert_eq!(s.experience_match(Some(3.0), Some(4.0)), Some(50.0));
  }

  #[test]
  fn experience_absent_without_both_inputs() {
    let s = scorer();
    assert_eq!(s.experience_match(None, Some(3.0)), None);
    assert_eq!(s.experience_match(Some(3.0), None), None);
  }

  // ── Semantic ──────────────────────────────────────────────────────────────

  #[test]
  fn identical_embeddings_score_100() {
    assert_eq!(semantic_similarity(&[0.3, 0.4], &[0.3, 0.4]), Some(100.0));
  }

  #[test]
  fn orthogonal_embeddings_score_50() {
    assert_eq!(semantic_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(50.0));
  }

  #[test]
  fn degenerate_embeddings_are_absent() {
    assert_eq!(semantic_similarity(&[1.0, 0.0], &[1.0]), None);
    assert_eq!(semantic_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
    assert_eq!(semantic_similarity(&[], &[]), None);
  }

  // ── Overall ───────────────────────────────────────────────────────────────

  #[test]
  fn absent_subscores_renormalise_weights() {
    // Skills 100, experience 50, no embeddings: (100·0.35 + 50·0.25) / 0.60.
    let b = scorer().score(
      &job(&["Rust"], Some(4.0), None),
      &candidate(&["Rust"], Some(2.0), None),
    );
    assert_eq!(b.semantic_similarity, None);
    assert_eq!(b.experience_match, Some(50.0));
    assert!((b.overall - 79.17).abs() < 0.01, "overall = {}", b.overall);
  }

  #[test]
  fn skill_only_overall_equals_skill_score() {
    let b = scorer().score(
      &job(&["Python", "FastAPI", "LLMs"], None, None),
      &candidate(&["Python"], None, None),
    );
    assert_eq!(b.overall, b.skills.score);
  }

  #[test]
  fn all_subscores_present_use_configured_weights() {
    let b = scorer().score(
      &job(&["Rust"], Some(2.0), Some(vec![1.0, 0.0])),
      &candidate(&["Rust"], Some(2.0), Some(vec![0.0, 1.0])),
    );
    // 100·0.35 + 100·0.25 + 50·0.40
    assert_eq!(b.overall, 80.0);
  }

  #[test]
  fn scoring_is_deterministic() {
    let j = job(&["Python", "SQL"], Some(3.0), Some(vec![0.1, 0.7, 0.2]));
    let c = candidate(&["python", "Airflow"], Some(1.7), Some(vec![0.3, 0.1, 0.9]));
    let s = scorer();
    let first = s.score(&j, &c);
    for _ in 0..10 {
      assert_eq!(s.score(&j, &c), first);
    }
  }

  // ── Config ────────────────────────────────────────────────────────────────

  #[test]
  fn default_weights_sum_to_one() {
    assert!((Weights::default().sum() - 1.0).abs() < 1e-9);
  }

  #[test]
  fn invalid_weights_are_rejected() {
    let negative = Weights { skill_match: -0.1, ..Default::default() };
    assert!(matches!(negative.validate(), Err(Error::InvalidWeights(_))));

    let zero = Weights { semantic_similarity: 0.0, skill_match: 0.0, experience_match: 0.0 };
    assert!(matches!(zero.validate(), Err(Error::InvalidWeights(_))));
  }

  #[test]
  fn zero_skill_weight_is_rejected() {
    let semantic_only = Weights { semantic_similarity: 1.0, skill_match: 0.0, experience_match: 0.0 };
    assert!(matches!(semantic_only.validate(), Err(Error::InvalidWeights(_))));

    let cfg = ScoringConfig { weights: semantic_only, ..Default::default() };
    assert!(matches!(Scorer::new(cfg), Err(Error::InvalidWeights(_))));

    let skills_only = Weights { semantic_similarity: 0.0, skill_match: 0.2, experience_match: 0.0 };
    assert!(skills_only.validate().is_ok());
  }

  #[test]
  fn floor_outside_unit_interval_is_rejected() {
    let cfg = ScoringConfig { experience_floor: 1.0, ..Default::default() };
    assert!(matches!(Scorer::new(cfg), Err(Error::InvalidExperienceFloor(_))));
  }
}
