// SPDX-License-Identifier: MIT

//! The recipe application built on the [crate::flow] engine:
//! configuration, external-service clients, the six step bodies, the
//! standard workflow wiring, and the HTTP chat server.

pub mod config;
pub mod llm;
pub mod places;
pub mod server;
pub mod steps;
pub mod workflow;
