use std::fmt;

use serde::{Deserialize, Serialize};

/// How a run was requested.
///
/// Informational only: the engine always runs exactly the requested nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
  Full,
  Partial,
  Single,
}

impl ExecutionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExecutionType::Full => "full",
      ExecutionType::Partial => "partial",
      ExecutionType::Single => "single",
    }
  }
}

impl fmt::Display for ExecutionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
