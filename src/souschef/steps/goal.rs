// SPDX-License-Identifier: MIT

//! Goal compliance step and verdict normalization

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};
use crate::souschef::llm::ChatModel;

const SYSTEM_PROMPT: &str = "\
You are a nutrition coach. Given a nutrient breakdown, a dietary goal, and \
the user's body weight in pounds, judge whether the recipe supports the \
goal. Answer with YES or NO on the first line, followed by one sentence of \
reasoning.";

/// Judges whether the nutrient profile supports the dietary goal.
///
/// Reads `nutrient_profile`, `goal`, `weight`; writes the raw verdict to
/// `goal_compliance` and sets `step`. Normalization of the verdict happens
/// in the router (see [is_compliant]).
pub struct GoalComplianceStep {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl GoalComplianceStep {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }
}

#[async_trait]
impl StepBody for GoalComplianceStep {
    fn name(&self) -> &str {
        "goal_evaluator"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let profile = state.require_str(keys::NUTRIENT_PROFILE)?;
        let goal = state.require_str(keys::GOAL)?;
        let weight = state.require(keys::WEIGHT)?.as_f64().ok_or_else(|| {
            StepError::Other(format!("state field '{}' is not a number", keys::WEIGHT))
        })?;

        log::info!("checking goal compliance (goal: {})", goal);
        let prompt = format!(
            "Dietary goal: {goal}\nBody weight: {weight} lbs\n\nNutrient breakdown:\n{profile}"
        );
        let verdict = self
            .model
            .complete(SYSTEM_PROMPT, &prompt, self.temperature)
            .await?;

        let mut update = StateUpdate::new();
        update.insert(keys::GOAL_COMPLIANCE.to_string(), json!(verdict));
        update.insert(keys::STEP.to_string(), json!("goal_evaluated"));
        Ok(update)
    }
}

/// Normalize the stored verdict: any value whose first character is `Y` or
/// `y` is compliant; anything else, including an absent field, is not.
/// Pure function of the state, used by the workflow's conditional router.
pub fn is_compliant(state: &StateRecord) -> bool {
    state
        .get_str(keys::GOAL_COMPLIANCE)
        .and_then(|verdict| verdict.trim_start().chars().next())
        .map(|first| first == 'Y' || first == 'y')
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::souschef::llm::tests_support::EchoModel;

    fn state_with_verdict(verdict: &str) -> StateRecord {
        StateRecord::with_fields([(keys::GOAL_COMPLIANCE, json!(verdict))])
    }

    #[test]
    fn test_is_compliant_yes_variants() {
        assert!(is_compliant(&state_with_verdict("YES")));
        assert!(is_compliant(&state_with_verdict("yes, it fits")));
        assert!(is_compliant(&state_with_verdict("Y")));
        assert!(is_compliant(&state_with_verdict("  Yes.")));
    }

    #[test]
    fn test_is_compliant_no_variants() {
        assert!(!is_compliant(&state_with_verdict("NO")));
        assert!(!is_compliant(&state_with_verdict("no way")));
        assert!(!is_compliant(&state_with_verdict("Maybe")));
        assert!(!is_compliant(&state_with_verdict("")));
    }

    #[test]
    fn test_is_compliant_absent_field() {
        assert!(!is_compliant(&StateRecord::new()));
    }

    #[tokio::test]
    async fn test_goal_step_writes_raw_verdict() {
        let step = GoalComplianceStep::new(Arc::new(EchoModel::new("YES - fits the goal")), 0.0);
        let state = StateRecord::with_fields([
            (keys::NUTRIENT_PROFILE, json!("420 kcal")),
            (keys::GOAL, json!("weight loss")),
            (keys::WEIGHT, json!(150)),
        ]);

        let update = step.invoke(&state).await.unwrap();
        assert_eq!(update[keys::GOAL_COMPLIANCE], json!("YES - fits the goal"));
        assert_eq!(update[keys::STEP], json!("goal_evaluated"));
    }

    #[tokio::test]
    async fn test_goal_step_requires_all_inputs() {
        let step = GoalComplianceStep::new(Arc::new(EchoModel::new("unused")), 0.0);
        let state = StateRecord::with_fields([(keys::NUTRIENT_PROFILE, json!("420 kcal"))]);

        let err = step.invoke(&state).await.unwrap_err();
        assert!(matches!(err, StepError::MissingField(key) if key == keys::GOAL));
    }

    #[tokio::test]
    async fn test_goal_step_rejects_non_numeric_weight() {
        let step = GoalComplianceStep::new(Arc::new(EchoModel::new("unused")), 0.0);
        let state = StateRecord::with_fields([
            (keys::NUTRIENT_PROFILE, json!("420 kcal")),
            (keys::GOAL, json!("weight loss")),
            (keys::WEIGHT, json!("heavy")),
        ]);

        let err = step.invoke(&state).await.unwrap_err();
        assert!(matches!(err, StepError::Other(_)));
    }
}
