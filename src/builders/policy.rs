use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::core::error::{GitExcludeError, Result};

/// What to do when exclude operations are disabled or cannot reach the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackBehavior {
    /// Log a warning and report success.
    #[default]
    Warn,
    /// Report success without logging.
    Silent,
    /// Return the failure to the caller.
    Error,
}

impl fmt::Display for FallbackBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackBehavior::Warn => write!(f, "warn"),
            FallbackBehavior::Silent => write!(f, "silent"),
            FallbackBehavior::Error => write!(f, "error"),
        }
    }
}

/// How a degraded failure was absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The failure was logged; carries the logged message.
    Warned(String),
    Suppressed,
}

impl Degradation {
    pub fn message(self) -> Option<String> {
        match self {
            Degradation::Warned(message) => Some(message),
            Degradation::Suppressed => None,
        }
    }
}

/// Applies the configured [`FallbackBehavior`] to a failure.
///
/// Every degradable failure in the engine goes through [`FailurePolicy::handle`],
/// so the warn/silent/error decision lives in one place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePolicy {
    behavior: FallbackBehavior,
}

impl FailurePolicy {
    pub fn new(behavior: FallbackBehavior) -> Self {
        Self { behavior }
    }

    /// Absorbs `failure` under `warn`/`silent`, or returns it under `error`.
    ///
    /// The warning names the operation and every affected path in one line.
    pub fn handle(&self, failure: GitExcludeError, operation: &str, paths: &[String]) -> Result<Degradation> {
        match self.behavior {
            FallbackBehavior::Error => Err(failure),
            FallbackBehavior::Silent => Ok(Degradation::Suppressed),
            FallbackBehavior::Warn => {
                let message = format!(
                    "Git exclude {operation} skipped for [{}]: {failure}",
                    paths.join(", ")
                );
                warn!("{message}");
                Ok(Degradation::Warned(message))
            }
        }
    }
}
