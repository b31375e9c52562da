//! Single-shot recipe dispatch.

use crate::error::Result;
use crate::options::{OptionParser, RecipeOptions};
use crate::output::Output;
use crate::query::QueryClient;
use crate::recipe::{Recipe, RecipeContext};
use crate::registry::RecipeRegistry;
use std::sync::Arc;

/// Runs recipes by name against a query client.
///
/// Holds no mutable state; one executor can serve any number of
/// independent invocations.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<RecipeRegistry>,
    client: Arc<dyn QueryClient>,
}

impl Executor {
    /// Creates an executor over a registry and a query client.
    pub fn new(registry: Arc<RecipeRegistry>, client: Arc<dyn QueryClient>) -> Self {
        Self { registry, client }
    }

    /// The registry this executor dispatches against.
    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }

    /// Runs `name` with raw option strings.
    ///
    /// Looks up the recipe, parses options, builds the query once, sends it
    /// through the client and post-processes the result. Option errors are
    /// reported before any query is built.
    pub async fn run<S: AsRef<str>>(&self, name: &str, raw_options: &[S]) -> Result<Output> {
        let recipe = self.registry.lookup(name)?;
        let options = parse_for(recipe.as_ref(), raw_options)?;
        self.run_parsed(recipe.as_ref(), &options).await
    }

    /// Runs an already resolved recipe with parsed options.
    pub async fn run_parsed(&self, recipe: &dyn Recipe, options: &RecipeOptions) -> Result<Output> {
        tracing::info!(recipe = %recipe.name(), "Running recipe");

        let query = recipe.query(options)?;
        tracing::debug!(recipe = %recipe.name(), body = %query.body, "Built query");

        let result = self.client.run(&query).await?;

        let ctx = RecipeContext::new(&self.registry, self.client.as_ref());
        let output = recipe.postprocess(&ctx, options, result).await?;

        tracing::info!(recipe = %recipe.name(), rows = output.len(), "Recipe completed");
        Ok(output)
    }

    /// Usage text for `name`.
    pub fn usage(&self, name: &str) -> Result<String> {
        Ok(self.registry.lookup(name)?.usage())
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn parse_for<S: AsRef<str>>(recipe: &dyn Recipe, raw: &[S]) -> Result<RecipeOptions> {
    OptionParser::new(recipe.name(), recipe.options())
        .with_description(recipe.description())
        .parse(raw)
}

// ============================================================================
// Tests
// ============================================================================
