// SPDX-License-Identifier: MIT

//! Recipe drafting step

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};
use crate::souschef::llm::ChatModel;

const SYSTEM_PROMPT: &str = "\
You are a creative and experienced chef specializing in recipe development. \
Create a detailed, practical recipe for the user's request. Always provide a \
complete ingredients list with measurements, numbered step-by-step \
instructions, cooking and prep time, and serving size. Consider dietary \
restrictions and preferences, and include helpful cooking tips when relevant.";

/// Drafts a recipe from the user request.
///
/// Reads `user_input`; writes `recipe` and `step`.
pub struct DraftRecipeStep {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl DraftRecipeStep {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }
}

#[async_trait]
impl StepBody for DraftRecipeStep {
    fn name(&self) -> &str {
        "recipe_creator"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let user_input = state.require_str(keys::USER_INPUT)?;

        log::info!("drafting recipe for request: {}", user_input);
        let recipe = self
            .model
            .complete(SYSTEM_PROMPT, user_input, self.temperature)
            .await?;

        let mut update = StateUpdate::new();
        update.insert(keys::RECIPE.to_string(), json!(recipe));
        update.insert(keys::STEP.to_string(), json!("recipe_created"));
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::souschef::llm::tests_support::EchoModel;

    #[tokio::test]
    async fn test_draft_writes_recipe_and_label() {
        let step = DraftRecipeStep::new(Arc::new(EchoModel::new("a fine taco recipe")), 0.7);
        let state = StateRecord::with_fields([(keys::USER_INPUT, json!("vegan taco"))]);

        let update = step.invoke(&state).await.unwrap();
        assert_eq!(update[keys::RECIPE], json!("a fine taco recipe"));
        assert_eq!(update[keys::STEP], json!("recipe_created"));
    }

    #[tokio::test]
    async fn test_draft_requires_user_input() {
        let step = DraftRecipeStep::new(Arc::new(EchoModel::new("unused")), 0.7);
        let err = step.invoke(&StateRecord::new()).await.unwrap_err();
        assert!(matches!(err, StepError::MissingField(key) if key == keys::USER_INPUT));
    }
}
