//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Profiles and string lists are compact
//! JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use hirerank_core::{
  profile::{CandidateId, JobId},
  report::{AssessmentReport, NarrativeStatus, Recommendation},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> { Ok(serde_json::from_str(s)?) }

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_narrative_status(s: NarrativeStatus) -> &'static str {
  match s {
    NarrativeStatus::Generated => "generated",
    NarrativeStatus::Unavailable => "unavailable",
  }
}

pub fn decode_narrative_status(s: &str) -> Result<NarrativeStatus> {
  match s {
    "generated" => Ok(NarrativeStatus::Generated),
    "unavailable" => Ok(NarrativeStatus::Unavailable),
    other => Err(Error::UnknownValue { field: "narrative_status", value: other.to_owned() }),
  }
}

pub fn decode_recommendation(s: &str) -> Result<Recommendation> {
  s.parse()
    .map_err(|_| Error::UnknownValue { field: "recommendation", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawAssessment::from_row`] and [`EncodedAssessment`].
pub const ASSESSMENT_COLUMNS: &str = "report_id, job_id, candidate_id, candidate_name,
  overall_score, skill_match_score, experience_match_score, semantic_similarity_score,
  matched_skills, missing_skills, extra_skills, strengths, weaknesses, reasoning,
  recommendation, narrative_status, job_fingerprint, candidate_fingerprint, created_at";

/// Raw values read directly from an `assessments` row.
pub struct RawAssessment {
  pub report_id:                 String,
  pub job_id:                    String,
  pub candidate_id:              String,
  pub candidate_name:            Option<String>,
  pub overall_score:             f64,
  pub skill_match_score:         f64,
  pub experience_match_score:    Option<f64>,
  pub semantic_similarity_score: Option<f64>,
  pub matched_skills:            String,
  pub missing_skills:            String,
  pub extra_skills:              String,
  pub strengths:                 String,
  pub weaknesses:                String,
  pub reasoning:                 String,
  pub recommendation:            String,
  pub narrative_status:          String,
  pub job_fingerprint:           String,
  pub candidate_fingerprint:     String,
  pub created_at:                String,
}

impl RawAssessment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:                 row.get(0)?,
      job_id:                    row.get(1)?,
      candidate_id:              row.get(2)?,
      candidate_name:            row.get(3)?,
      overall_score:             row.get(4)?,
      skill_match_score:         row.get(5)?,
      experience_match_score:    row.get(6)?,
      semantic_similarity_score: row.get(7)?,
      matched_skills:            row.get(8)?,
      missing_skills:            row.get(9)?,
      extra_skills:              row.get(10)?,
      strengths:                 row.get(11)?,
      weaknesses:                row.get(12)?,
      reasoning:                 row.get(13)?,
      recommendation:            row.get(14)?,
      narrative_status:          row.get(15)?,
      job_fingerprint:           row.get(16)?,
      candidate_fingerprint:     row.get(17)?,
      created_at:                row.get(18)?,
    })
  }

  pub fn into_report(self) -> Result<AssessmentReport> {
    Ok(AssessmentReport {
      report_id:                 decode_uuid(&self.report_id)?,
      job_id:                    JobId(self.job_id),
      candidate_id:              CandidateId(self.candidate_id),
      candidate_name:            self.candidate_name,
      overall_score:             self.overall_score,
      skill_match_score:         self.skill_match_score,
      experience_match_score:    self.experience_match_score,
      semantic_similarity_score: self.semantic_similarity_score,
      matched_skills:            decode_json(&self.matched_skills)?,
      missing_skills:            decode_json(&self.missing_skills)?,
      extra_skills:              decode_json(&self.extra_skills)?,
      strengths:                 decode_json(&self.strengths)?,
      weaknesses:                decode_json(&self.weaknesses)?,
      reasoning:                 self.reasoning,
      recommendation:            decode_recommendation(&self.recommendation)?,
      narrative_status:          decode_narrative_status(&self.narrative_status)?,
      job_fingerprint:           self.job_fingerprint,
      candidate_fingerprint:     self.candidate_fingerprint,
      created_at:                decode_dt(&self.created_at)?,
    })
  }
}

/// An [`AssessmentReport`] flattened to owned column values, ready to move
/// into a `conn.call` closure.
pub struct EncodedAssessment {
  pub report_id:                 String,
  pub job_id:                    String,
  pub candidate_id:              String,
  pub candidate_name:            Option<String>,
  pub overall_score:             f64,
  pub skill_match_score:         f64,
  pub experience_match_score:    Option<f64>,
  pub semantic_similarity_score: Option<f64>,
  pub matched_skills:            String,
  pub missing_skills:            String,
  pub extra_skills:              String,
  pub strengths:                 String,
  pub weaknesses:                String,
  pub reasoning:                 String,
  pub recommendation:            String,
  pub narrative_status:          &'static str,
  pub job_fingerprint:           String,
  pub candidate_fingerprint:     String,
  pub created_at:                String,
}

impl EncodedAssessment {
  pub fn new(r: &AssessmentReport) -> Result<Self> {
    Ok(Self {
      report_id:                 encode_uuid(r.report_id),
      job_id:                    r.job_id.0.clone(),
      candidate_id:              r.candidate_id.0.clone(),
      candidate_name:            r.candidate_name.clone(),
      overall_score:             r.overall_score,
      skill_match_score:         r.skill_match_score,
      experience_match_score:    r.experience_match_score,
      semantic_similarity_score: r.semantic_similarity_score,
      matched_skills:            encode_json(&r.matched_skills)?,
      missing_skills:            encode_json(&r.missing_skills)?,
      extra_skills:              encode_json(&r.extra_skills)?,
      strengths:                 encode_json(&r.strengths)?,
      weaknesses:                encode_json(&r.weaknesses)?,
      reasoning:                 r.reasoning.clone(),
      recommendation:            r.recommendation.to_string(),
      narrative_status:          encode_narrative_status(r.narrative_status),
      job_fingerprint:           r.job_fingerprint.clone(),
      candidate_fingerprint:     r.candidate_fingerprint.clone(),
      created_at:                encode_dt(r.created_at),
    })
  }

  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      &format!(
        "INSERT INTO assessments ({ASSESSMENT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
      ),
      rusqlite::params![
        self.report_id,
        self.job_id,
        self.candidate_id,
        self.candidate_name,
        self.overall_score,
        self.skill_match_score,
        self.experience_match_score,
        self.semantic_similarity_score,
        self.matched_skills,
        self.missing_skills,
        self.extra_skills,
        self.strengths,
        self.weaknesses,
        self.reasoning,
        self.recommendation,
        self.narrative_status,
        self.job_fingerprint,
        self.candidate_fingerprint,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}
