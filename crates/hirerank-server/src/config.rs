//! Server configuration, deserialised from `config.toml` and `HIRERANK_*`
//! environment variables.

use std::path::PathBuf;

use hirerank_engine::EngineConfig;
use serde::Deserialize;

/// Runtime server configuration. Every field has a default, so an absent
/// config file yields a working local server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub engine:     EngineConfig,
  pub narrator:   NarratorConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/hirerank/hirerank.db"),
      engine:     EngineConfig::default(),
      narrator:   NarratorConfig::default(),
    }
  }
}

/// Connection settings for the chat-completions narrative backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
  /// When false, every report is numeric-only.
  pub enabled:            bool,
  /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
  pub base_url:           String,
  pub model:              String,
  pub api_key:            Option<String>,
  pub temperature:        f32,
  pub request_timeout_ms: u64,
}

impl Default for NarratorConfig {
  fn default() -> Self {
    Self {
      enabled:            false,
      base_url:           "http://127.0.0.1:11434/v1".into(),
      model:              "llama3.1".into(),
      api_key:            None,
      temperature:        0.3,
      request_timeout_ms: 30_000,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn load(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = load("");
    assert_eq!(cfg.port, 8080);
    assert!(!cfg.narrator.enabled);
    assert_eq!(cfg.engine, EngineConfig::default());
  }

  #[test]
  fn nested_sections_override_single_fields() {
    let cfg = load(
      r#"
      port = 9000

      [engine]
      max_concurrency = 8

      [engine.scoring.weights]
      semantic_similarity = 0.0
      skill_match = 0.5
      experience_match = 0.5

      [narrator]
      enabled = true
      model = "gpt-4o-mini"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.engine.max_concurrency, 8);
    assert_eq!(cfg.engine.retriever_top_k, 50);
    assert_eq!(cfg.engine.scoring.weights.skill_match, 0.5);
    assert!(cfg.narrator.enabled);
    assert_eq!(cfg.narrator.model, "gpt-4o-mini");
    assert_eq!(cfg.narrator.request_timeout_ms, 30_000);
  }
}
