// SPDX-License-Identifier: MIT

//! Step body adapter trait
//!
//! A step body is the unit of work attached to a graph node. It reads the
//! current state and returns a partial update; the executor performs the
//! merge. Non-degrading steps propagate failures, which end the run. A
//! degrading step catches its own external failure and returns a default
//! update instead (see the venue lookup step in the application layer).

use async_trait::async_trait;

use super::error::StepError;
use super::state::{StateRecord, StateUpdate};

/// Core trait for all step bodies
#[async_trait]
pub trait StepBody: Send + Sync {
    /// Returns the step body name (informational, used in logs)
    fn name(&self) -> &str;

    /// Consume the current state, produce a partial update. The step must
    /// not mutate anything outside its own return value.
    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError>;
}
