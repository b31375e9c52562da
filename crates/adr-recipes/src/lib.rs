#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Declarative adr recipes.
//!
//! Recipes here are data: a TOML descriptor holding a JSON query template,
//! option definitions, and output steps. The built-in set is compiled in;
//! more can be loaded from directories at startup.

pub mod builtin;
pub mod contexts;
pub mod descriptor;
pub mod loader;
pub mod template;

pub use builtin::builtin_recipes;
pub use descriptor::{OutputSpec, RecipeDescriptor};
pub use loader::{load_dir, load_file};
pub use template::TemplateRecipe;

use adr_core::{RecipeRegistry, Result};
use std::path::PathBuf;

/// Builds the registry from the built-ins followed by each directory.
///
/// A name defined twice, across built-ins or directories, fails with
/// [`adr_core::Error::DuplicateRecipe`].
pub fn default_registry(dirs: &[PathBuf]) -> Result<RecipeRegistry> {
    let mut registry = RecipeRegistry::new();
    for recipe in builtin_recipes()? {
        registry.register(recipe)?;
    }
    for dir in dirs {
        for recipe in load_dir(dir)? {
            registry.register(recipe)?;
        }
    }
    tracing::debug!(recipes = registry.len(), "Recipe registry ready");
    Ok(registry)
}
