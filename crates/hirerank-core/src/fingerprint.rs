//! Content fingerprints for profiles.
//!
//! A fingerprint is the lowercase hex SHA-256 of the profile's JSON encoding.
//! Reports record the fingerprints they were computed from, so an edited
//! profile can be detected and its reports invalidated.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
  Result,
  profile::{CandidateProfile, JobProfile},
};

pub fn fingerprint<T: Serialize>(value: &T) -> Result<String> {
  let bytes = serde_json::to_vec(value)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

pub fn job_fingerprint(job: &JobProfile) -> Result<String> { fingerprint(job) }

pub fn candidate_fingerprint(candidate: &CandidateProfile) -> Result<String> {
  fingerprint(candidate)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::profile::{ExperienceRequirement, JobId};

  fn job(title: &str) -> JobProfile {
    JobProfile {
      id:               JobId::from("JOB-1"),
      title:            title.into(),
      seniority:        None,
      required_skills:  vec!["Rust".into()],
      preferred_skills: vec![],
      experience:       ExperienceRequirement::default(),
      domain:           None,
      summary:          None,
      responsibilities: vec![],
      embedding:        None,
    }
  }

  #[test]
  fn stable_for_equal_profiles() {
    let a = job_fingerprint(&job("Backend")).unwrap();
    assert_eq!(a, job_fingerprint(&job("Backend")).unwrap());
    assert_eq!(a.len(), 64);
  }

  #[test]
  fn changes_when_profile_changes() {
    assert_ne!(
      job_fingerprint(&job("Backend")).unwrap(),
      job_fingerprint(&job("Frontend")).unwrap()
    );
  }
}
