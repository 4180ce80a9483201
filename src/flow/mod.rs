// SPDX-License-Identifier: MIT

//! Graph-based workflow engine
//!
//! This module provides:
//! - `StateRecord` - the per-run field map threaded through all steps
//! - `StepBody` - the adapter trait each unit of work implements
//! - `GraphSpec` / `Graph` - validated step registry + edge table
//! - the bounded run-loop that drives a graph to termination

pub mod error;
pub mod executor;
pub mod graph;
pub mod state;
pub mod step;

pub use error::{BuildError, RunError, StepError};
pub use executor::{RunEvent, RunOptions};
pub use graph::{Graph, GraphSpec, Transition, END};
pub use state::{StateRecord, StateUpdate};
pub use step::StepBody;
