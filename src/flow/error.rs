// SPDX-License-Identifier: MIT

//! Typed errors for the workflow engine
//!
//! Build-time defects (`BuildError`) fail graph construction and never reach
//! an end user. Run-time failures (`RunError`) end a single run; the caller
//! decides what to surface.

use thiserror::Error;

/// Graph construction defects. All of these indicate a miswired graph
/// definition and must fail the process that attempts the build.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Entry step id is not in the registry
    #[error("entry step '{0}' is not registered")]
    UnknownEntry(String),

    /// A registered step has no outgoing transition
    #[error("step '{0}' has no outgoing transition")]
    DanglingStep(String),

    /// A transition names a destination that is neither a registered step
    /// nor the terminal marker
    #[error("step '{step}' routes to unknown destination '{dest}'")]
    UnknownDestination { step: String, dest: String },

    /// The same step id was registered more than once
    #[error("step id '{0}' registered more than once")]
    DuplicateStepId(String),
}

/// Failures raised by a step body during `invoke`
#[derive(Debug, Error)]
pub enum StepError {
    /// A required state field was absent. Indicates a misordered graph,
    /// treated as a fatal programming error.
    #[error("required state field '{0}' is missing")]
    MissingField(String),

    /// An external service call failed
    #[error("{provider} call failed: {message}")]
    Service { provider: String, message: String },

    /// Anything else (malformed field values, etc.)
    #[error("{0}")]
    Other(String),
}

impl StepError {
    pub fn service(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Service {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

/// Outcomes that end a run without reaching the terminal marker, plus
/// step failures propagated from non-degrading steps.
#[derive(Debug, Error)]
pub enum RunError {
    /// A non-degrading step failed
    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },

    /// A conditional router returned a destination outside its allow-list.
    /// This is a router-author defect, not a transient condition.
    #[error("router at step '{step}' returned '{got}' (allowed: {allowed:?})")]
    InvalidRouterOutcome {
        step: String,
        got: String,
        allowed: Vec<String>,
    },

    /// The loop bound was hit before the graph reached the terminal marker
    #[error("loop limit reached after {steps} steps (stalled at '{step}')")]
    LoopLimitExceeded { step: String, steps: u32 },

    /// The caller-supplied deadline expired between steps
    #[error("run cancelled before step '{step}'")]
    Cancelled { step: String },
}
