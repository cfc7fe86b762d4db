use serde::{Deserialize, Serialize};

/// Policy knobs for how a run reports its outcome.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RunPolicyConfig {
    /// Exit with a failure status when the run fails.
    ///
    /// When `false` the process reports success even if the run failed; the failure is
    /// still recorded in the operational log.
    #[serde(default)]
    pub exit_on_failure: bool,
    /// Treat a failed operational log append as a run failure.
    #[serde(default)]
    pub escalate_log_failures: bool,
    /// Read the store back after writing it and check the row count.
    #[serde(default = "default_verify_write")]
    pub verify_write: bool,
}

impl Default for RunPolicyConfig {
    fn default() -> Self {
        Self {
            exit_on_failure: false,
            escalate_log_failures: false,
            verify_write: default_verify_write(),
        }
    }
}

const fn default_verify_write() -> bool {
    true
}
