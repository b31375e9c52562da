#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! adr core library
//!
//! Recipes, their options, the registry that names them, and the executor
//! that runs them against a [`QueryClient`]. Transport lives in
//! `adr-client`; built-in recipe descriptors live in `adr-recipes`.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod options;
pub mod output;
pub mod query;
pub mod recipe;
pub mod registry;

// Re-exports for convenience
pub use cache::CachingQueryClient;
pub use config::{AdrConfig, AppConfig, CacheConfig, ClientConfig};
pub use error::{Error, Result};
pub use executor::Executor;
pub use options::{OptionParser, OptionSpec, OptionType, RecipeOptions};
pub use output::{Output, OutputFormat};
pub use query::{MockQueryClient, Query, QueryClient, QueryResult};
pub use recipe::{Recipe, RecipeContext};
pub use registry::RecipeRegistry;
