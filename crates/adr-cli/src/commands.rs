//! Command implementations.
//!
//! Handlers return the text to print so they can be tested without
//! capturing stdout.

use crate::cli::{Cli, Command};
use crate::config_handlers::handle_config_command;
use adr_client::ActiveDataClient;
use adr_core::{
    AdrConfig, CachingQueryClient, Error, Executor, OutputFormat, RecipeRegistry, Result,
};
use std::sync::Arc;

/// Loads configuration and applies command-line overrides.
pub fn load_config(cli: &Cli) -> Result<AdrConfig> {
    let mut config = AdrConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    config.validate()?;
    Ok(config)
}

/// Builds the registry and an HTTP-backed executor, caching results when
/// the `[cache]` section enables it.
pub fn build_executor(config: &AdrConfig) -> Result<Executor> {
    let registry = adr_recipes::default_registry(&config.recipe_paths)?;
    let client = ActiveDataClient::from_config(config)?;
    let client = CachingQueryClient::wrap(Arc::new(client), &config.cache);
    Ok(Executor::new(Arc::new(registry), client))
}

/// Runs the parsed command line, returning text for stdout.
pub async fn dispatch(cli: Cli) -> Result<String> {
    if let Command::Config { action } = cli.command {
        return handle_config_command(cli.config.as_deref(), action);
    }

    let config = load_config(&cli)?;
    let executor = build_executor(&config)?;

    match cli.command.recipe_invocation() {
        Some((name, args)) => run_recipe(&executor, name, args, config.format).await,
        None => Ok(format_recipe_list(executor.registry())),
    }
}

/// Runs one recipe and renders its output, or returns its usage when the
/// recipe's option parser sees `-h`/`--help`.
pub async fn run_recipe(
    executor: &Executor,
    name: &str,
    args: &[String],
    format: OutputFormat,
) -> Result<String> {
    match executor.run(name, args).await {
        Ok(output) => output.render(format),
        Err(Error::Help { usage, .. }) => Ok(usage),
        Err(e) => Err(e),
    }
}

/// Recipe names and descriptions, one per line, in name order.
pub fn format_recipe_list(registry: &RecipeRegistry) -> String {
    let width = registry
        .iter()
        .map(|r| r.name().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for recipe in registry.iter() {
        let line = format!("{:<width$}  {}", recipe.name(), recipe.description());
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
