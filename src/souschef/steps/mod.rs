// SPDX-License-Identifier: MIT

//! The six step bodies of the recipe workflow
//!
//! Each step reads a documented set of state fields and writes its own.
//! All external clients are injected at construction; nothing here reads
//! the environment.

mod draft;
mod goal;
mod nutrition;
mod render;
mod review;
mod venues;

pub use draft::DraftRecipeStep;
pub use goal::{is_compliant, GoalComplianceStep};
pub use nutrition::NutritionAnalysisStep;
pub use render::RenderFinalStep;
pub use review::QualityReviewStep;
pub use venues::VenueLookupStep;

/// State field names shared by the steps. The record itself is
/// schema-less; this is the superset of keys the standard workflow uses.
pub mod keys {
    /// Original user request text (seeded by the caller)
    pub const USER_INPUT: &str = "user_input";
    /// Dietary goal, e.g. "weight loss" (seeded by the caller)
    pub const GOAL: &str = "goal";
    /// User body weight in pounds (seeded by the caller)
    pub const WEIGHT: &str = "weight";
    /// Drafted recipe text
    pub const RECIPE: &str = "recipe";
    /// Macro/micro nutrient breakdown of the draft
    pub const NUTRIENT_PROFILE: &str = "nutrient_profile";
    /// Raw goal verdict; first char Y/y means compliant
    pub const GOAL_COMPLIANCE: &str = "goal_compliance";
    /// Quality review text
    pub const EVALUATION: &str = "evaluation";
    /// Auxiliary list of venue records
    pub const RESTAURANT_SUGGESTIONS: &str = "restaurant_suggestions";
    /// Rendered final artifact
    pub const FINAL_OUTPUT: &str = "final_output";
    /// Label of the most recently completed step
    pub const STEP: &str = "step";
}
