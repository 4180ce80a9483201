// SPDX-License-Identifier: MIT

//! Quality review step

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};
use crate::souschef::llm::ChatModel;

const SYSTEM_PROMPT: &str = "\
You are an expert culinary reviewer and food safety specialist. Evaluate \
the recipe for cooking logic, food safety, ingredient compatibility, and \
clarity of instructions, taking the nutrient breakdown and the user's \
dietary goal into account. Provide an overall assessment, strengths, areas \
for improvement, safety considerations, and a final recommendation.";

/// Reviews the accepted draft for quality and safety.
///
/// Reads `recipe`, `nutrient_profile`, `goal`; writes `evaluation` and
/// `step`.
pub struct QualityReviewStep {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl QualityReviewStep {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }
}

#[async_trait]
impl StepBody for QualityReviewStep {
    fn name(&self) -> &str {
        "recipe_evaluator"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let recipe = state.require_str(keys::RECIPE)?;
        let profile = state.require_str(keys::NUTRIENT_PROFILE)?;
        let goal = state.require_str(keys::GOAL)?;

        log::info!("reviewing recipe quality");
        let prompt = format!(
            "Please evaluate this recipe:\n\n{recipe}\n\nNutrient breakdown:\n{profile}\n\nDietary goal: {goal}"
        );
        let evaluation = self
            .model
            .complete(SYSTEM_PROMPT, &prompt, self.temperature)
            .await?;

        let mut update = StateUpdate::new();
        update.insert(keys::EVALUATION.to_string(), json!(evaluation));
        update.insert(keys::STEP.to_string(), json!("recipe_evaluated"));
        Ok(update)
    }
}
