// SPDX-License-Identifier: MIT

//! The standard recipe workflow
//!
//! Wires the six step bodies into the graph:
//!
//! ```text
//! create_recipe -> analyze_nutrition -> check_goal --(compliant)--> evaluate_recipe
//!       ^                                   |                             |
//!       +------------(non-compliant)--------+                     find_restaurants
//!                                                                         |
//!                                                                  format_output -> END
//! ```
//!
//! The cycle back to `create_recipe` is deliberate; the executor's step
//! bound keeps a never-compliant verdict from looping forever.

use serde_json::json;
use std::sync::Arc;

use crate::flow::{BuildError, Graph, GraphSpec, RunError, RunEvent, RunOptions, StateRecord, END};
use crate::souschef::config::AppConfig;
use crate::souschef::llm::ChatModel;
use crate::souschef::places::PlacesSearch;
use crate::souschef::steps::{
    self, keys, DraftRecipeStep, GoalComplianceStep, NutritionAnalysisStep, QualityReviewStep,
    RenderFinalStep, VenueLookupStep,
};
use tokio::sync::mpsc;

pub const CREATE_RECIPE: &str = "create_recipe";
pub const ANALYZE_NUTRITION: &str = "analyze_nutrition";
pub const CHECK_GOAL: &str = "check_goal";
pub const EVALUATE_RECIPE: &str = "evaluate_recipe";
pub const FIND_RESTAURANTS: &str = "find_restaurants";
pub const FORMAT_OUTPUT: &str = "format_output";

/// Caller-supplied run parameters
#[derive(Debug, Clone)]
pub struct WorkflowParams {
    pub goal: String,
    pub weight: u32,
}

/// Build the standard six-step graph from injected collaborators.
/// Side-effect-free; call once and reuse the graph across runs.
pub fn build_recipe_graph(
    model: Arc<dyn ChatModel>,
    places: Arc<dyn PlacesSearch>,
    config: &AppConfig,
) -> Result<Graph, BuildError> {
    GraphSpec::new(CREATE_RECIPE)
        .add_step(
            CREATE_RECIPE,
            Arc::new(DraftRecipeStep::new(
                model.clone(),
                config.creative_temperature,
            )),
        )
        .add_step(
            ANALYZE_NUTRITION,
            Arc::new(NutritionAnalysisStep::new(
                model.clone(),
                config.analytical_temperature,
            )),
        )
        .add_step(
            CHECK_GOAL,
            Arc::new(GoalComplianceStep::new(
                model.clone(),
                config.analytical_temperature,
            )),
        )
        .add_step(
            EVALUATE_RECIPE,
            Arc::new(QualityReviewStep::new(model, config.creative_temperature)),
        )
        .add_step(
            FIND_RESTAURANTS,
            Arc::new(VenueLookupStep::new(
                places,
                config.default_location.clone(),
                config.venue_radius_meters,
                config.venue_max_results,
            )),
        )
        .add_step(FORMAT_OUTPUT, Arc::new(RenderFinalStep))
        .edge(CREATE_RECIPE, ANALYZE_NUTRITION)
        .edge(ANALYZE_NUTRITION, CHECK_GOAL)
        .conditional_edge(
            CHECK_GOAL,
            vec![CREATE_RECIPE.to_string(), EVALUATE_RECIPE.to_string()],
            |state| {
                if steps::is_compliant(state) {
                    EVALUATE_RECIPE.to_string()
                } else {
                    CREATE_RECIPE.to_string()
                }
            },
        )
        .edge(EVALUATE_RECIPE, FIND_RESTAURANTS)
        .edge(FIND_RESTAURANTS, FORMAT_OUTPUT)
        .edge(FORMAT_OUTPUT, END)
        .build()
}

/// Initial state for one run: request text plus run parameters
pub fn initial_state(request: &str, params: &WorkflowParams) -> StateRecord {
    StateRecord::with_fields([
        (keys::USER_INPUT, json!(request)),
        (keys::GOAL, json!(params.goal)),
        (keys::WEIGHT, json!(params.weight)),
        (keys::STEP, json!("starting")),
    ])
}

/// A built recipe workflow, reusable across runs
pub struct RecipeWorkflow {
    graph: Arc<Graph>,
    options: RunOptions,
}

impl RecipeWorkflow {
    pub fn new(
        model: Arc<dyn ChatModel>,
        places: Arc<dyn PlacesSearch>,
        config: &AppConfig,
    ) -> Result<Self, BuildError> {
        let graph = Arc::new(build_recipe_graph(model, places, config)?);
        Ok(Self {
            graph,
            options: RunOptions {
                max_steps: config.max_steps,
                deadline: None,
            },
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Run the workflow to termination and return the rendered artifact
    pub async fn run(&self, request: &str, params: &WorkflowParams) -> Result<String, RunError> {
        log::info!("starting recipe workflow for: {}", request);
        let state = self
            .graph
            .run(initial_state(request, params), &self.options)
            .await?;
        final_output(&state)
    }

    /// Run with progress events for the streaming endpoint
    pub async fn run_with_events(
        &self,
        request: &str,
        params: &WorkflowParams,
        events: mpsc::Sender<RunEvent>,
    ) -> Result<String, RunError> {
        let state = self
            .graph
            .run_with_events(initial_state(request, params), &self.options, events)
            .await?;
        final_output(&state)
    }
}

fn final_output(state: &StateRecord) -> Result<String, RunError> {
    state
        .require_str(keys::FINAL_OUTPUT)
        .map(|s| s.to_string())
        .map_err(|source| RunError::Step {
            step: FORMAT_OUTPUT.to_string(),
            source,
        })
}
