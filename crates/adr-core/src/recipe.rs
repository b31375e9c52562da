//! The [`Recipe`] capability interface.
//!
//! A recipe answers exactly one question: it declares its options, turns
//! parsed options into a backend [`Query`], and post-processes the backend's
//! [`QueryResult`] into an [`Output`] table.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Pushes;
//!
//! #[async_trait]
//! impl Recipe for Pushes {
//!     fn name(&self) -> &str { "pushes" }
//!     fn description(&self) -> &str { "List recent pushes." }
//!     fn query(&self, options: &RecipeOptions) -> Result<Query> {
//!         Ok(Query::new(self.name(), json!({"from": "repo", "limit": 10})))
//!     }
//! }
//! ```

use crate::error::Result;
use crate::options::{OptionParser, OptionSpec, RecipeOptions};
use crate::output::Output;
use crate::query::{Query, QueryClient, QueryResult};
use crate::registry::RecipeRegistry;
use async_trait::async_trait;

/// A named, parameterized query plus post-processing.
#[async_trait]
pub trait Recipe: Send + Sync {
    /// Unique registry name.
    fn name(&self) -> &str;

    /// One-line description shown by `adr list`.
    fn description(&self) -> &str;

    /// Accepted options, in declaration order.
    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    /// Builds the backend query from parsed options.
    fn query(&self, options: &RecipeOptions) -> Result<Query>;

    /// Turns the backend result into output rows.
    ///
    /// The default converts the result as-is. Overrides may issue follow-up
    /// queries through `ctx`.
    async fn postprocess(
        &self,
        ctx: &RecipeContext<'_>,
        options: &RecipeOptions,
        result: QueryResult,
    ) -> Result<Output> {
        let _ = (ctx, options);
        Output::from_query_result(result)
    }

    /// Usage text for this recipe's options.
    fn usage(&self) -> String {
        OptionParser::new(self.name(), self.options())
            .with_description(self.description())
            .usage()
    }
}

/// Collaborators available to a recipe while it post-processes.
#[derive(Clone, Copy)]
pub struct RecipeContext<'a> {
    registry: &'a RecipeRegistry,
    client: &'a dyn QueryClient,
}

impl<'a> RecipeContext<'a> {
    /// Creates a context around the registry and a query client.
    pub fn new(registry: &'a RecipeRegistry, client: &'a dyn QueryClient) -> Self {
        Self { registry, client }
    }

    /// The registry the running recipe was dispatched from.
    pub fn registry(&self) -> &'a RecipeRegistry {
        self.registry
    }

    /// Runs an additional backend query.
    pub async fn run_query(&self, query: &Query) -> Result<QueryResult> {
        tracing::debug!(query = %query.name, "Running follow-up query");
        self.client.run(query).await
    }

    /// Builds another registered recipe's query and runs it.
    ///
    /// `options` are laid over the named recipe's defaults. Only the query
    /// runs; the named recipe's post-processing does not.
    pub async fn run_named(&self, name: &str, options: &RecipeOptions) -> Result<QueryResult> {
        let recipe = self.registry.lookup(name)?;
        let mut resolved = OptionParser::new(recipe.name(), recipe.options()).defaults()?;
        resolved.merge(options);

        let query = recipe.query(&resolved)?;
        tracing::debug!(recipe = %name, body = %query.body, "Running named recipe query");
        self.client.run(&query).await
    }
}

impl std::fmt::Debug for RecipeContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeContext").finish_non_exhaustive()
    }
}
