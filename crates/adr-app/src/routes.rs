//! HTTP routes.
//!
//! Every request is an independent recipe execution against a shared,
//! read-only [`Executor`].

use crate::error::{ApiError, ApiResult};
use adr_core::{Executor, OptionSpec, OptionType, OutputFormat, Recipe};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Query parameter selecting the output format of `/run`.
pub const FORMAT_PARAM: &str = "format";

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    executor: Arc<Executor>,
}

impl AppState {
    /// Wraps an executor for sharing across handlers.
    pub fn new(executor: Executor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/{name}", get(describe_recipe))
        .route("/api/recipes/{name}/run", get(run_recipe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Response bodies
// ============================================================================

/// Health check response.
#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the server answers.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Number of registered recipes.
    pub recipe_count: usize,
}

/// A recipe as listed by `/api/recipes`.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeSummary {
    /// Recipe name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Accepted options.
    pub options: Vec<OptionSpec>,
}

impl RecipeSummary {
    fn of(recipe: &dyn Recipe) -> Self {
        Self {
            name: recipe.name().to_string(),
            description: recipe.description().to_string(),
            options: recipe.options().to_vec(),
        }
    }
}

/// A single recipe with its usage text.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeDetail {
    /// Name, description and options.
    #[serde(flatten)]
    pub summary: RecipeSummary,
    /// Usage text, as `adr <recipe> --help` prints it.
    pub usage: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "adr-app",
        version: env!("CARGO_PKG_VERSION"),
        recipe_count: state.executor.registry().len(),
    })
}

async fn list_recipes(State(state): State<AppState>) -> Json<Vec<RecipeSummary>> {
    let recipes = state
        .executor
        .registry()
        .iter()
        .map(|r| RecipeSummary::of(r.as_ref()))
        .collect();
    Json(recipes)
}

async fn describe_recipe(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = state.executor.registry().lookup(&name)?;
    Ok(Json(RecipeDetail {
        summary: RecipeSummary::of(recipe.as_ref()),
        usage: recipe.usage(),
    }))
}

async fn run_recipe(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let recipe = state.executor.registry().lookup(&name)?;

    let mut format = OutputFormat::Json;
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in &params {
        if key == FORMAT_PARAM {
            format = value
                .parse()
                .map_err(|_| ApiError::bad_request(format!("unknown format '{value}'")))?;
        } else {
            pairs.push((key.as_str(), value.as_str()));
        }
    }
    let args = to_arguments(recipe.options(), pairs);
    tracing::debug!(recipe = %name, ?args, "Running recipe from request");

    let parsed = adr_core::OptionParser::new(recipe.name(), recipe.options())
        .with_description(recipe.description())
        .parse(&args);
    let options = match parsed {
        Ok(options) => options,
        Err(adr_core::Error::Help { usage, .. }) => {
            return Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], usage).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    let output = state.executor.run_parsed(recipe.as_ref(), &options).await?;

    if format == OutputFormat::Json {
        return Ok(Json(output).into_response());
    }
    let body = output.render(format)?;
    Ok(([(header::CONTENT_TYPE, content_type(format))], body).into_response())
}

/// Turns `key=value` query pairs into recipe option arguments.
///
/// A key naming an option becomes `--long=value` through the option's long
/// flag, or the short flag followed by the value when it has none. Values
/// for the positional option are appended after `--`. Any other key becomes
/// `--key=value` so the parser rejects it. An empty value passes the bare
/// flag.
pub fn to_arguments<'p>(
    specs: &[OptionSpec],
    pairs: impl IntoIterator<Item = (&'p str, &'p str)>,
) -> Vec<String> {
    let mut args = Vec::new();
    let mut positional = Vec::new();

    for (key, value) in pairs {
        let spec = specs.iter().find(|s| s.name == key);
        if spec.is_some_and(|s| s.positional) {
            if !value.is_empty() {
                positional.push(value.to_string());
            }
            continue;
        }

        let flags = spec.map(OptionSpec::effective_flags).unwrap_or_default();
        let long = flags.iter().find(|f| f.starts_with("--"));
        match (long, flags.first()) {
            (None, Some(short)) => {
                // Shorts take `=` for flags and hyphen-leading values.
                let attached = spec.is_some_and(|s| s.option_type == OptionType::Flag)
                    || value.starts_with('-');
                if value.is_empty() {
                    args.push(short.clone());
                } else if attached {
                    args.push(format!("{short}={value}"));
                } else {
                    args.push(short.clone());
                    args.push(value.to_string());
                }
            }
            (long, _) => {
                let flag = long.cloned().unwrap_or_else(|| format!("--{key}"));
                if value.is_empty() {
                    args.push(flag);
                } else {
                    args.push(format!("{flag}={value}"));
                }
            }
        }
    }

    if !positional.is_empty() {
        args.push("--".to_string());
        args.extend(positional);
    }
    args
}

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

fn content_type(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "application/json",
        OutputFormat::Csv => "text/csv; charset=utf-8",
        OutputFormat::Markdown => "text/markdown; charset=utf-8",
        OutputFormat::Table => TEXT_PLAIN,
    }
}
