//! Evaluation limits.
//!
//! The machine never grows the host stack, so the depth limit is what
//! reproduces the stack overflow a naive recursive evaluator would hit.

pub const DEFAULT_MAX_DEPTH: usize = 10_000;
pub const DEFAULT_MAX_STEPS: u64 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
  /// Maximum number of pending continuation frames
  pub max_depth: usize,
  /// Maximum number of machine transitions per evaluation
  pub max_steps: u64,
}

impl Default for EvalConfig {
  fn default() -> Self {
    EvalConfig {
      max_depth: DEFAULT_MAX_DEPTH,
      max_steps: DEFAULT_MAX_STEPS,
    }
  }
}

impl EvalConfig {
  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn with_max_steps(mut self, max_steps: u64) -> Self {
    self.max_steps = max_steps;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builders_override_single_limits() {
    let config = EvalConfig::default().with_max_depth(8);
    assert_eq!(config.max_depth, 8);
    assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);

    let config = config.with_max_steps(100);
    assert_eq!(config.max_depth, 8);
    assert_eq!(config.max_steps, 100);
  }
}
