// SPDX-License-Identifier: MIT

//! souschef-rs - recipe creation and evaluation workflows
//!
//! The crate is split into two layers:
//! - [flow] - the generic graph workflow engine (state records, graph
//!   building, the bounded run-loop)
//! - [souschef] - the recipe application built on top of it (step bodies,
//!   LLM and places clients, HTTP server)

pub mod flow;
pub mod souschef;
