//! Recipes compiled into the binary.

use crate::descriptor::RecipeDescriptor;
use crate::template::TemplateRecipe;
use adr_core::Result;

/// `(file name, descriptor text)` for every built-in recipe.
pub const BUILTIN_DESCRIPTORS: &[(&str, &str)] = &[
    (
        "decision_artifacts.toml",
        include_str!("../recipes/decision_artifacts.toml"),
    ),
    (
        "failure_classifications.toml",
        include_str!("../recipes/failure_classifications.toml"),
    ),
    (
        "push_results.toml",
        include_str!("../recipes/push_results.toml"),
    ),
    (
        "push_revisions.toml",
        include_str!("../recipes/push_revisions.toml"),
    ),
    (
        "task_durations.toml",
        include_str!("../recipes/task_durations.toml"),
    ),
];

/// Parses every built-in descriptor.
pub fn builtin_recipes() -> Result<Vec<TemplateRecipe>> {
    BUILTIN_DESCRIPTORS
        .iter()
        .map(|(file, text)| {
            TemplateRecipe::from_descriptor(RecipeDescriptor::from_toml_str(text, file)?)
        })
        .collect()
}
