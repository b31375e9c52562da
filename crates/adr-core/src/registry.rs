//! The recipe registry.
//!
//! A [`RecipeRegistry`] maps recipe names to [`Recipe`] implementations. It
//! is built once at process start, then shared read-only (typically behind
//! an `Arc`) with the executor.

use crate::error::{Error, Result};
use crate::options::validate_specs;
use crate::recipe::Recipe;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name-ordered collection of recipes.
#[derive(Default, Clone)]
pub struct RecipeRegistry {
    recipes: BTreeMap<String, Arc<dyn Recipe>>,
}

impl RecipeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recipe under its own name.
    ///
    /// Fails with [`Error::DuplicateRecipe`] when the name is taken and with
    /// [`Error::InvalidDefinition`] when the recipe's name or option specs
    /// are malformed.
    pub fn register<R: Recipe + 'static>(&mut self, recipe: R) -> Result<()> {
        self.register_arc(Arc::new(recipe))
    }

    /// Registers an already shared recipe.
    pub fn register_arc(&mut self, recipe: Arc<dyn Recipe>) -> Result<()> {
        let name = recipe.name().to_string();
        if name.trim().is_empty() {
            return Err(Error::invalid_definition(name, "recipe name is empty"));
        }
        if self.recipes.contains_key(&name) {
            return Err(Error::DuplicateRecipe { name });
        }
        validate_specs(&name, recipe.options())?;

        tracing::debug!(recipe = %name, "Registered recipe");
        self.recipes.insert(name, recipe);
        Ok(())
    }

    /// All registered names in lexicographic order.
    pub fn list(&self) -> Vec<String> {
        self.recipes.keys().cloned().collect()
    }

    /// Finds a recipe by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Recipe>> {
        self.recipes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_recipe(name, self.list()))
    }

    /// Returns whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Number of registered recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Returns whether no recipes are registered.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Recipe>> {
        self.recipes.values()
    }
}

impl std::fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeRegistry")
            .field("recipes", &self.list())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
