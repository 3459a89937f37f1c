//! Narrative generation over an OpenAI-compatible chat-completions API.
//!
//! Assessments ask the model for a JSON object with `strengths`,
//! `weaknesses`, `reasoning` and `recommendation`; ranking summaries ask for
//! plain prose. Any transport failure, non-2xx status or unparseable body is
//! a [`NarratorError`], which the engine turns into a score-only report.

use std::{fmt::Write as _, time::Duration};

use hirerank_core::{
  narrative::{Narrative, NarrativeGenerator},
  profile::{CandidateProfile, JobProfile},
  report::AssessmentReport,
  scoring::ScoreBreakdown,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NarratorConfig;

const SYSTEM_PROMPT: &str = "You are an experienced technical recruiter. You assess candidates \
                             objectively and refer to concrete skills and experience.";

/// Skills beyond this many are left out of the prompt.
const PROMPT_SKILL_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum NarratorError {
  #[error("narrative generation is disabled")]
  Disabled,
  #[error("narrator request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("narrator returned {status}: {body}")]
  Status { status: StatusCode, body: String },
  #[error("malformed narrator response: {0}")]
  Malformed(String),
}

// ─── Narrator ────────────────────────────────────────────────────────────────

/// The generator the server runs with, chosen from [`NarratorConfig`].
pub enum Narrator {
  Http(HttpNarrator),
  /// Fails every call at once so reports degrade to numeric-only without
  /// waiting out the engine's timeout.
  Disabled,
}

impl Narrator {
  pub fn from_config(config: &NarratorConfig) -> Result<Self, NarratorError> {
    if !config.enabled {
      return Ok(Self::Disabled);
    }
    Ok(Self::Http(HttpNarrator::new(config)?))
  }
}

impl NarrativeGenerator for Narrator {
  type Error = NarratorError;

  async fn generate(
    &self,
    job: &JobProfile,
    candidate: &CandidateProfile,
    scores: &ScoreBreakdown,
  ) -> Result<Narrative, NarratorError> {
    match self {
      Self::Http(http) => http.generate(job, candidate, scores).await,
      Self::Disabled => Err(NarratorError::Disabled),
    }
  }

  async fn summarize(
    &self,
    job: &JobProfile,
    top: &[AssessmentReport],
  ) -> Result<String, NarratorError> {
    match self {
      Self::Http(http) => http.summarize(job, top).await,
      Self::Disabled => Err(NarratorError::Disabled),
    }
  }
}

// ─── HTTP client ─────────────────────────────────────────────────────────────

/// Chat-completions client. Cheap to clone.
#[derive(Clone)]
pub struct HttpNarrator {
  client:      Client,
  base_url:    String,
  model:       String,
  api_key:     Option<String>,
  temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:           &'a str,
  temperature:     f32,
  messages:        [ChatMessage<'a>; 2],
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

impl HttpNarrator {
  pub fn new(config: &NarratorConfig) -> Result<Self, NarratorError> {
    let client = Client::builder()
      .timeout(Duration::from_millis(config.request_timeout_ms))
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
      model: config.model.clone(),
      api_key: config.api_key.clone().filter(|k| !k.is_empty()),
      temperature: config.temperature,
    })
  }

  fn url(&self) -> String { format!("{}/chat/completions", self.base_url) }

  /// One round trip; returns the first choice's message content.
  async fn complete(&self, prompt: &str, json: bool) -> Result<String, NarratorError> {
    let body = ChatRequest {
      model:           &self.model,
      temperature:     self.temperature,
      messages:        [
        ChatMessage { role: "system", content: SYSTEM_PROMPT },
        ChatMessage { role: "user", content: prompt },
      ],
      response_format: json.then_some(ResponseFormat { kind: "json_object" }),
    };

    let mut req = self.client.post(self.url()).json(&body);
    if let Some(key) = &self.api_key {
      req = req.bearer_auth(key);
    }
    let resp = req.send().await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(NarratorError::Status { status, body });
    }

    let parsed: ChatResponse = resp
      .json()
      .await
      .map_err(|e| NarratorError::Malformed(e.to_string()))?;
    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|c| c.trim().to_owned())
      .filter(|c| !c.is_empty())
      .ok_or_else(|| NarratorError::Malformed("response has no content".into()))
  }
}

impl NarrativeGenerator for HttpNarrator {
  type Error = NarratorError;

  async fn generate(
    &self,
    job: &JobProfile,
    candidate: &CandidateProfile,
    scores: &ScoreBreakdown,
  ) -> Result<Narrative, NarratorError> {
    let content = self.complete(&assessment_prompt(job, candidate, scores), true).await?;
    let narrative = parse_narrative(&content)?;
    tracing::debug!(
      job_id = %job.id,
      candidate_id = %candidate.id,
      strengths = narrative.strengths.len(),
      weaknesses = narrative.weaknesses.len(),
      "narrative generated"
    );
    Ok(narrative)
  }

  async fn summarize(
    &self,
    job: &JobProfile,
    top: &[AssessmentReport],
  ) -> Result<String, NarratorError> {
    self.complete(&summary_prompt(job, top), false).await
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

fn list(items: &[String]) -> String {
  if items.is_empty() { "none".into() } else { items.join(", ") }
}

fn or_unknown(value: Option<&str>) -> &str { value.unwrap_or("not specified") }

fn experience_text(job: &JobProfile) -> String {
  let req = &job.experience;
  match (req.minimum(), req.maximum(), req.text.as_deref()) {
    (Some(min), Some(max), _) => format!("{min}-{max} years"),
    (Some(min), None, _) => format!("at least {min} years"),
    (None, Some(max), _) => format!("up to {max} years"),
    (None, None, Some(text)) => text.to_owned(),
    (None, None, None) => "not specified".into(),
  }
}

fn score_text(score: Option<f64>) -> String {
  score.map_or_else(|| "not assessed".into(), |s| format!("{s:.1}/100"))
}

pub(crate) fn assessment_prompt(
  job: &JobProfile,
  candidate: &CandidateProfile,
  scores: &ScoreBreakdown,
) -> String {
  let skills: Vec<String> = candidate.skills.iter().take(PROMPT_SKILL_LIMIT).cloned().collect();
  let years = candidate
    .years_of_experience()
    .map_or_else(|| "unknown".into(), |y| format!("{y} years"));

  let mut p = String::new();
  let _ = writeln!(p, "Assess this candidate for the role below.\n");
  let _ = writeln!(p, "ROLE");
  let _ = writeln!(p, "- Title: {}", job.title);
  let _ = writeln!(p, "- Seniority: {}", or_unknown(job.seniority.as_deref()));
  let _ = writeln!(p, "- Required skills: {}", list(&job.required_skills));
  let _ = writeln!(p, "- Preferred skills: {}", list(&job.preferred_skills));
  let _ = writeln!(p, "- Experience: {}", experience_text(job));
  let _ = writeln!(p, "- Domain: {}\n", or_unknown(job.domain.as_deref()));
  let _ = writeln!(p, "CANDIDATE");
  let _ = writeln!(p, "- Name: {}", candidate.display_name());
  let _ = writeln!(p, "- Headline: {}", or_unknown(candidate.headline.as_deref()));
  let _ = writeln!(p, "- Experience: {years}");
  let _ = writeln!(p, "- Skills: {}", list(&skills));
  let _ = writeln!(p, "- Summary: {}\n", or_unknown(candidate.summary.as_deref()));
  let _ = writeln!(p, "SCORES");
  let _ = writeln!(p, "- Overall: {:.1}/100", scores.overall);
  let _ = writeln!(p, "- Skill match: {:.1}/100", scores.skills.score);
  let _ = writeln!(p, "  - Matched: {}", list(&scores.skills.matched));
  let _ = writeln!(p, "  - Missing: {}", list(&scores.skills.missing));
  let _ = writeln!(p, "- Experience match: {}", score_text(scores.experience_match));
  let _ = writeln!(p, "- Semantic similarity: {}\n", score_text(scores.semantic_similarity));
  let _ = writeln!(
    p,
    "Reply with a JSON object with these keys:\n\
     - \"strengths\": 3 to 5 short strings on why the candidate fits\n\
     - \"weaknesses\": 2 to 4 short strings on gaps or concerns\n\
     - \"reasoning\": 2 or 3 sentences explaining the overall assessment\n\
     - \"recommendation\": one of \"Strong Interview\" (85 and above), \"Interview\" \
     (70 to 84), \"Maybe\" (55 to 69) or \"Reject\" (below 55)"
  );
  p
}

pub(crate) fn summary_prompt(job: &JobProfile, top: &[AssessmentReport]) -> String {
  let mut p = format!("Summarise the leading candidates for the {} position.\n\n", job.title);
  p.push_str("TOP CANDIDATES\n");
  for (i, r) in top.iter().enumerate() {
    let name = r.candidate_name.as_deref().unwrap_or(r.candidate_id.as_str());
    let _ = writeln!(p, "{}. {name}: {:.1}/100, {}", i + 1, r.overall_score, r.recommendation);
  }
  if let Some(first) = top.first() {
    let _ = writeln!(p, "\nLeader's strengths: {}", list(&first.strengths));
    let _ = writeln!(p, "Leader's weaknesses: {}", list(&first.weaknesses));
  }
  p.push_str(
    "\nWrite a 3 to 4 sentence executive summary covering the strongest candidate and why, \
     the overall quality of the pool, and any notable patterns or concerns. Reply with the \
     summary text only.",
  );
  p
}

/// Parse the model's JSON reply, tolerating a Markdown code fence.
pub(crate) fn parse_narrative(content: &str) -> Result<Narrative, NarratorError> {
  let trimmed = content.trim();
  let body = trimmed
    .strip_prefix("```json")
    .or_else(|| trimmed.strip_prefix("```"))
    .and_then(|rest| rest.trim_end().strip_suffix("```"))
    .unwrap_or(trimmed);

  let narrative: Narrative =
    serde_json::from_str(body.trim()).map_err(|e| NarratorError::Malformed(e.to_string()))?;
  if narrative.reasoning.trim().is_empty() {
    return Err(NarratorError::Malformed("missing reasoning".into()));
  }
  Ok(narrative)
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode as HttpStatus, header},
    routing::post,
  };
  use hirerank_core::scoring::{Scorer, ScoringConfig};
  use serde_json::{Value, json};
  use tokio::net::TcpListener;

  use super::*;

  #[derive(Default)]
  struct Seen {
    body: Option<Value>,
    auth: Option<String>,
  }

  /// Serve `reply` with `status` on `/v1/chat/completions`, recording the
  /// last request.
  async fn stub(status: HttpStatus, reply: String) -> (NarratorConfig, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let captured = Arc::clone(&seen);
    let app = Router::new().route(
      "/v1/chat/completions",
      post(move |headers: HeaderMap, Json(body): Json<Value>| {
        let captured = Arc::clone(&captured);
        let reply = reply.clone();
        async move {
          let mut seen = captured.lock().unwrap();
          seen.body = Some(body);
          seen.auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
          (status, reply)
        }
      }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let config = NarratorConfig {
      enabled: true,
      base_url: format!("http://{addr}/v1/"),
      model: "test-model".into(),
      api_key: Some("sk-test".into()),
      request_timeout_ms: 5_000,
      ..NarratorConfig::default()
    };
    (config, seen)
  }

  fn completion(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
  }

  fn job() -> JobProfile {
    serde_json::from_value(json!({
      "id": "JOB-1",
      "title": "AI Engineer",
      "required_skills": ["Python", "FastAPI", "LLMs"],
      "experience": { "text": "3+ years" },
    }))
    .unwrap()
  }

  fn candidate() -> CandidateProfile {
    serde_json::from_value(json!({
      "id": "CAND-1",
      "name": "Ada",
      "skills": ["Python", "Docker", "LangChain"],
      "total_experience_years": 2.5,
    }))
    .unwrap()
  }

  fn scores() -> ScoreBreakdown {
    Scorer::new(ScoringConfig::default()).unwrap().score(&job(), &candidate())
  }

  fn report(name: &str, score: f64) -> AssessmentReport {
    serde_json::from_value(json!({
      "report_id": "0b6f4bbf-52e4-4c4a-9a3c-1f0f1a3c0e11",
      "job_id": "JOB-1",
      "candidate_id": "CAND-1",
      "candidate_name": name,
      "overall_score": score,
      "skill_match_score": score,
      "matched_skills": ["Python"],
      "missing_skills": [],
      "extra_skills": [],
      "strengths": ["Strong Python"],
      "weaknesses": ["No FastAPI"],
      "reasoning": "Solid.",
      "recommendation": "Interview",
      "narrative_status": "generated",
      "job_fingerprint": "",
      "candidate_fingerprint": "",
      "created_at": "2024-05-01T12:00:00Z",
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn generate_parses_the_json_reply() {
    let reply = r#"{"strengths":["Python"],"weaknesses":["No FastAPI"],"reasoning":"Close fit.","recommendation":"maybe"}"#;
    let (config, seen) = stub(HttpStatus::OK, completion(reply)).await;
    let narrator = Narrator::from_config(&config).unwrap();

    let narrative = narrator.generate(&job(), &candidate(), &scores()).await.unwrap();
    assert_eq!(narrative.strengths, ["Python"]);
    assert_eq!(narrative.reasoning, "Close fit.");
    assert_eq!(narrative.recommendation, "maybe");

    let seen = seen.lock().unwrap();
    let body = seen.body.as_ref().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert!(body["messages"][1]["content"].as_str().unwrap().contains("Missing: FastAPI, LLMs"));
    assert_eq!(seen.auth.as_deref(), Some("Bearer sk-test"));
  }

  #[tokio::test]
  async fn summarize_returns_plain_text() {
    let (config, seen) = stub(HttpStatus::OK, completion("  Ada leads the pool.  ")).await;
    let narrator = HttpNarrator::new(&config).unwrap();

    let summary = narrator.summarize(&job(), &[report("Ada", 72.0)]).await.unwrap();
    assert_eq!(summary, "Ada leads the pool.");

    let seen = seen.lock().unwrap();
    let body = seen.body.as_ref().unwrap();
    assert!(body.get("response_format").is_none());
    assert!(body["messages"][1]["content"].as_str().unwrap().contains("1. Ada: 72.0/100, Interview"));
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let (config, _) = stub(HttpStatus::TOO_MANY_REQUESTS, "slow down".into()).await;
    let narrator = HttpNarrator::new(&config).unwrap();

    let err = narrator.generate(&job(), &candidate(), &scores()).await.unwrap_err();
    match err {
      NarratorError::Status { status, body } => {
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, "slow down");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn unparseable_content_is_malformed() {
    let (config, _) = stub(HttpStatus::OK, completion("I think they are great")).await;
    let narrator = HttpNarrator::new(&config).unwrap();
    let err = narrator.generate(&job(), &candidate(), &scores()).await.unwrap_err();
    assert!(matches!(err, NarratorError::Malformed(_)));

    let (config, _) = stub(HttpStatus::OK, "<html>".into()).await;
    let narrator = HttpNarrator::new(&config).unwrap();
    let err = narrator.summarize(&job(), &[]).await.unwrap_err();
    assert!(matches!(err, NarratorError::Malformed(_)));
  }

  #[tokio::test]
  async fn disabled_narrator_fails_immediately() {
    let narrator = Narrator::from_config(&NarratorConfig::default()).unwrap();
    assert!(matches!(narrator, Narrator::Disabled));
    let err = narrator.generate(&job(), &candidate(), &scores()).await.unwrap_err();
    assert!(matches!(err, NarratorError::Disabled));
  }

  #[test]
  fn fenced_json_is_accepted() {
    let n = parse_narrative("```json\n{\"reasoning\":\"ok\",\"recommendation\":\"Reject\"}\n```")
      .unwrap();
    assert_eq!(n.reasoning, "ok");
    assert!(n.strengths.is_empty());
  }

  #[test]
  fn empty_reasoning_is_rejected() {
    assert!(matches!(
      parse_narrative(r#"{"strengths":["x"],"reasoning":"  "}"#),
      Err(NarratorError::Malformed(_))
    ));
  }

  #[test]
  fn assessment_prompt_carries_requirements_and_scores() {
    let prompt = assessment_prompt(&job(), &candidate(), &scores());
    assert!(prompt.contains("- Required skills: Python, FastAPI, LLMs"));
    assert!(prompt.contains("- Experience: at least 3 years"));
    assert!(prompt.contains("- Experience: 2.5 years"));
    assert!(prompt.contains("- Semantic similarity: not assessed"));
    assert!(prompt.contains("\"Strong Interview\" (85 and above)"));
  }

  #[test]
  fn explicit_minimum_is_not_mixed_with_a_parsed_maximum() {
    let mut job = job();
    job.experience.min_years = Some(4.0);
    job.experience.text = Some("2-3 years".into());
    let prompt = assessment_prompt(&job, &candidate(), &scores());
    assert!(prompt.contains("- Experience: at least 4 years"));
    assert!(!prompt.contains("4-3 years"));
  }
}
