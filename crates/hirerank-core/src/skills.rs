//! Skill-name normalisation.
//!
//! Skills are compared by a normalised key: trimmed, lower-cased, internal
//! whitespace collapsed, then mapped through an alias table so that `"JS"` and
//! `"JavaScript"` compare equal. Display always keeps the caller's spelling.

use std::collections::HashMap;

/// Aliases applied after basic normalisation, as `(alias, canonical)`.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
  ("amazon web services", "aws"),
  ("c sharp", "c#"),
  ("cpp", "c++"),
  ("gcp", "google cloud"),
  ("golang", "go"),
  ("js", "javascript"),
  ("k8s", "kubernetes"),
  ("large language models", "llms"),
  ("llm", "llms"),
  ("ml", "machine learning"),
  ("node", "node.js"),
  ("nodejs", "node.js"),
  ("postgres", "postgresql"),
  ("psql", "postgresql"),
  ("py", "python"),
  ("python3", "python"),
  ("react.js", "react"),
  ("reactjs", "react"),
  ("ts", "typescript"),
];

/// Maps raw skill strings to comparison keys.
#[derive(Debug, Clone, Default)]
pub struct SkillNormalizer {
  extra: HashMap<String, String>,
}

impl SkillNormalizer {
  /// A normaliser using only the built-in alias table.
  pub fn new() -> Self { Self::default() }

  /// A normaliser with additional `(alias, canonical)` pairs. Extra aliases
  /// take precedence over the built-in table.
  pub fn with_aliases<I, K, V>(aliases: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    let extra = aliases
      .into_iter()
      .map(|(k, v)| (collapse(k.as_ref()), collapse(v.as_ref())))
      .filter(|(k, v)| !k.is_empty() && !v.is_empty())
      .collect();
    Self { extra }
  }

  /// The comparison key for `skill`. Blank input yields an empty key.
  pub fn normalize(&self, skill: &str) -> String {
    let basic = collapse(skill);
    if let Some(canonical) = self.extra.get(&basic) {
      return canonical.clone();
    }
    BUILTIN_ALIASES
      .iter()
      .find(|(alias, _)| *alias == basic)
      .map(|(_, canonical)| (*canonical).to_owned())
      .unwrap_or(basic)
  }

  /// Normalise a list, keeping the first spelling of each key and dropping
  /// blanks. Returns `(key, display)` pairs in input order.
  pub fn dedupe(&self, skills: &[String]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(skills.len());
    for skill in skills {
      let key = self.normalize(skill);
      if key.is_empty() || out.iter().any(|(k, _)| *k == key) {
        continue;
      }
      out.push((key, skill.trim().to_owned()));
    }
    out
  }
}

fn collapse(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
