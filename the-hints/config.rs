use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};

/// Engine tuning knobs. Plain data so hosts can surface them in their own
/// configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HintConfig {
  /// Quiet window between the last trigger and recomputation, in
  /// milliseconds.
  pub quiet_period_ms:          u64,
  /// How long a lookup may run before the presenter gets a slow-computation
  /// callback, in milliseconds.
  pub slow_hint_delay_ms:       u64,
  /// Wrap limit for rendered signatures, in characters.
  pub max_hint_width:           usize,
  /// Whether quiet (background) invocations are honored. Explicit
  /// invocation always works.
  pub auto_hints:               bool,
  /// Surface lookup failures from [`pump`](crate::HintEngine::pump) instead
  /// of degrading to a hidden hint. Meant for tests.
  pub propagate_handler_errors: bool,
}

impl Default for HintConfig {
  fn default() -> Self {
    Self {
      quiet_period_ms:          200,
      slow_hint_delay_ms:       1000,
      max_hint_width:           80,
      auto_hints:               true,
      propagate_handler_errors: false,
    }
  }
}

impl HintConfig {
  pub fn quiet_period(&self) -> Duration {
    Duration::from_millis(self.quiet_period_ms)
  }

  pub fn slow_hint_delay(&self) -> Duration {
    Duration::from_millis(self.slow_hint_delay_ms)
  }
}
