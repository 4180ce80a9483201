// SPDX-License-Identifier: MIT

//! Final rendering step
//!
//! Pure formatting, no external calls: combines the accepted draft, the
//! review, and any venue suggestions into the final markdown artifact.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::Write;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};

/// Renders the final artifact.
///
/// Reads `recipe` and `evaluation` (plus `restaurant_suggestions` when
/// present); writes `final_output` and marks `step` completed.
pub struct RenderFinalStep;

impl RenderFinalStep {
    fn render(recipe: &str, evaluation: &str, venues: Option<&Value>) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "# Recipe Creation & Evaluation Results\n\n\
             ## Generated Recipe\n{recipe}\n\n\
             ---\n\n\
             ## Professional Evaluation\n{evaluation}\n"
        );

        if let Some(entries) = venues.and_then(|v| v.as_array()) {
            if !entries.is_empty() {
                out.push_str("\n---\n\n## Nearby Restaurants\n");
                for entry in entries {
                    let name = entry["name"].as_str().unwrap_or("(unnamed)");
                    let address = entry["address"].as_str().unwrap_or("");
                    match entry["rating"].as_f64() {
                        Some(rating) => {
                            let _ = writeln!(out, "- {name} — {address} (rated {rating:.1})");
                        }
                        None => {
                            let _ = writeln!(out, "- {name} — {address}");
                        }
                    }
                }
            }
        }

        out.push_str(
            "\n---\n\n*This recipe was drafted and reviewed by our recipe workflow for quality assurance.*",
        );
        out.trim().to_string()
    }
}

#[async_trait]
impl StepBody for RenderFinalStep {
    fn name(&self) -> &str {
        "format_output"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let recipe = state.require_str(keys::RECIPE)?;
        let evaluation = state.require_str(keys::EVALUATION)?;
        let venues = state.get(keys::RESTAURANT_SUGGESTIONS);

        log::info!("formatting final response");
        let final_output = Self::render(recipe, evaluation, venues);

        let mut update = StateUpdate::new();
        update.insert(keys::FINAL_OUTPUT.to_string(), json!(final_output));
        update.insert(keys::STEP.to_string(), json!("completed"));
        Ok(update)
    }
}
