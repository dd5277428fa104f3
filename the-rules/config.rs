//! Input rules described in TOML.
//!
//! ```toml
//! max-match = 500
//!
//! [[rules]]
//! pattern = "--$"
//! replace = "—"
//!
//! [[rules]]
//! pattern = '(?:^|[\s{\[(<])(")$'
//! replace = "“"
//! undoable = false
//! ```
//!
//! Only literal replacements can be configured; handler rules are built in
//! code and can be appended to the configured ones.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::input_rules::{
  InputRules,
  MAX_MATCH,
  Rule,
  RuleError,
};

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid input rules config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("input rule #{index}: {source}")]
  Rule {
    index:  usize,
    #[source]
    source: RuleError,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct InputRulesConfig {
  pub max_match: usize,
  pub rules:     Vec<RuleConfig>,
}

impl Default for InputRulesConfig {
  fn default() -> Self {
    Self {
      max_match: MAX_MATCH,
      rules:     Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleConfig {
  pub pattern:  String,
  pub replace:  String,
  #[serde(default = "default_undoable")]
  pub undoable: bool,
}

fn default_undoable() -> bool {
  true
}

impl InputRulesConfig {
  pub fn from_toml(contents: &str) -> Result<Self> {
    Ok(toml::from_str(contents)?)
  }

  /// Compile the configured rules, in order, followed by `extra`.
  pub fn build_with(&self, extra: impl IntoIterator<Item = Rule>) -> Result<InputRules> {
    let mut rules = self
      .rules
      .iter()
      .enumerate()
      .map(|(index, rule)| {
        Rule::replace(&rule.pattern, &rule.replace)
          .map(|compiled| compiled.undoable(rule.undoable))
          .map_err(|source| ConfigError::Rule { index, source })
      })
      .collect::<Result<Vec<_>>>()?;
    rules.extend(extra);

    Ok(InputRules::new(rules).with_max_match(self.max_match))
  }

  pub fn build(&self) -> Result<InputRules> {
    self.build_with([])
  }
}
