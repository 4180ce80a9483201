// SPDX-License-Identifier: MIT

//! Nutrient breakdown step

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};
use crate::souschef::llm::ChatModel;

const SYSTEM_PROMPT: &str = "\
You are a registered dietitian. Given a recipe, produce a concise nutrient \
breakdown per serving: estimated calories, protein, carbohydrates, fat, \
fiber, and sodium, plus any notable micronutrients. Base estimates on the \
stated ingredients and quantities; state assumptions where quantities are \
vague.";

/// Breaks down the nutritional content of the current draft.
///
/// Reads `recipe`; writes `nutrient_profile` and `step`.
pub struct NutritionAnalysisStep {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl NutritionAnalysisStep {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }
}

#[async_trait]
impl StepBody for NutritionAnalysisStep {
    fn name(&self) -> &str {
        "nutrition_analyst"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let recipe = state.require_str(keys::RECIPE)?;

        log::info!("running nutritional analysis");
        let prompt = format!("Break down the nutritional content of this recipe:\n\n{recipe}");
        let profile = self
            .model
            .complete(SYSTEM_PROMPT, &prompt, self.temperature)
            .await?;

        let mut update = StateUpdate::new();
        update.insert(keys::NUTRIENT_PROFILE.to_string(), json!(profile));
        update.insert(keys::STEP.to_string(), json!("nutrients_analyzed"));
        Ok(update)
    }
}
