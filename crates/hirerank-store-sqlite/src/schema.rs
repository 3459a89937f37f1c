//! SQL schema for the hirerank SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS jobs (
    job_id       TEXT PRIMARY KEY,
    profile_json TEXT NOT NULL,
    fingerprint  TEXT NOT NULL,    -- hex SHA-256 of profile_json
    updated_at   TEXT NOT NULL
);

-- job_id is the job applied to directly. Not a foreign key: candidates may be
-- uploaded before their job.
CREATE TABLE IF NOT EXISTS candidates (
    candidate_id TEXT PRIMARY KEY,
    job_id       TEXT,
    profile_json TEXT NOT NULL,
    embedding    TEXT,             -- JSON array of f32, copied out for retrieval
    fingerprint  TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- At most one report per (job, candidate). Replaced by delete + insert.
CREATE TABLE IF NOT EXISTS assessments (
    report_id                 TEXT PRIMARY KEY,
    job_id                    TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    candidate_id              TEXT NOT NULL REFERENCES candidates(candidate_id) ON DELETE CASCADE,
    candidate_name            TEXT,
    overall_score             REAL NOT NULL,
    skill_match_score         REAL NOT NULL,
    experience_match_score    REAL,
    semantic_similarity_score REAL,
    matched_skills            TEXT NOT NULL DEFAULT '[]',
    missing_skills            TEXT NOT NULL DEFAULT '[]',
    extra_skills              TEXT NOT NULL DEFAULT '[]',
    strengths                 TEXT NOT NULL DEFAULT '[]',
    weaknesses                TEXT NOT NULL DEFAULT '[]',
    reasoning                 TEXT NOT NULL,
    recommendation            TEXT NOT NULL,
    narrative_status          TEXT NOT NULL,   -- 'generated' | 'unavailable'
    job_fingerprint           TEXT NOT NULL,
    candidate_fingerprint     TEXT NOT NULL,
    created_at                TEXT NOT NULL,
    UNIQUE (job_id, candidate_id)
);

CREATE INDEX IF NOT EXISTS candidates_job_idx       ON candidates(job_id);
CREATE INDEX IF NOT EXISTS assessments_candidate_idx ON assessments(candidate_id);

PRAGMA user_version = 1;
";
