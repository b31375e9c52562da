//! Shared fixtures for adr-core integration tests.

use adr_core::{
    Executor, MockQueryClient, OptionSpec, OptionType, Output, Query, QueryResult, Recipe,
    RecipeContext, RecipeOptions, RecipeRegistry, Result,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Recipe listing task results for one revision.
pub struct TaskResults {
    specs: Vec<OptionSpec>,
    pub query_calls: Arc<AtomicUsize>,
}

impl TaskResults {
    pub fn new() -> Self {
        Self {
            specs: vec![
                OptionSpec::new("rev")
                    .with_flags(&["-r", "--rev"])
                    .with_help("Push revision")
                    .required(),
                OptionSpec::new("result")
                    .with_choices(&["success", "testfailed", "busted"])
                    .with_help("Only tasks with this result"),
                OptionSpec::new("limit")
                    .with_type(OptionType::Integer)
                    .with_default(100),
                OptionSpec::new("labels").positional(),
            ],
            query_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Recipe for TaskResults {
    fn name(&self) -> &str {
        "task_results"
    }

    fn description(&self) -> &str {
        "Task results for a push."
    }

    fn options(&self) -> &[OptionSpec] {
        &self.specs
    }

    fn query(&self, options: &RecipeOptions) -> Result<Query> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let mut filters = vec![json!({"eq": {"repo.changeset.id12": options.get_str("rev")}})];
        if let Some(result) = options.get_str("result") {
            filters.push(json!({"eq": {"task.state": result}}));
        }
        let labels = options.get_list("labels");
        if !labels.is_empty() {
            filters.push(json!({"in": {"run.name": labels}}));
        }
        Ok(Query::new(
            self.name(),
            json!({
                "from": "task",
                "select": ["run.name", "task.state"],
                "where": {"and": filters},
                "limit": options.get_i64("limit"),
                "format": "table"
            }),
        ))
    }

    async fn postprocess(
        &self,
        _ctx: &RecipeContext<'_>,
        _options: &RecipeOptions,
        result: QueryResult,
    ) -> Result<Output> {
        Output::from_query_result(result)?.sort_by_column("run.name", false)
    }
}

/// Table result with three tasks, unsorted.
pub fn task_table() -> QueryResult {
    QueryResult::table(
        vec!["run.name".to_string(), "task.state".to_string()],
        vec![
            vec![json!("test-linux/opt-mochitest"), json!("completed")],
            vec![json!("build-linux/opt"), json!("completed")],
            vec![json!("test-windows/debug-xpcshell"), json!("failed")],
        ],
    )
}

/// Executor over a registry holding one [`TaskResults`] recipe.
pub fn harness(client: Arc<MockQueryClient>) -> (Executor, Arc<AtomicUsize>) {
    let recipe = TaskResults::new();
    let calls = Arc::clone(&recipe.query_calls);
    let mut registry = RecipeRegistry::new();
    if let Err(e) = registry.register(recipe) {
        panic!("fixture recipe must register: {e}");
    }
    (Executor::new(Arc::new(registry), client), calls)
}
