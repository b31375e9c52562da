//! TOML recipe descriptors.
//!
//! ```toml
//! name = "push_results"
//! description = "Task results for a single push."
//! contexts = ["rev", "branch", "limit"]
//! query = '''
//! {"from": "task", "where": {"eq": {"repo.changeset.id12": "{{rev}}"}}, "limit": "{{limit}}"}
//! '''
//!
//! [[options]]
//! name = "result"
//! choices = ["success", "testfailed", "busted"]
//!
//! [output]
//! columns = ["label", "result"]
//! sort_by = "label"
//! ```

use adr_core::{Error, OptionSpec, Result};
use serde::{Deserialize, Serialize};

/// A data-only recipe definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDescriptor {
    /// Registry name.
    pub name: String,

    /// One-line description.
    #[serde(default)]
    pub description: String,

    /// Shared option definitions to include, by context name.
    #[serde(default)]
    pub contexts: Vec<String>,

    /// Query template as JSON text.
    pub query: String,

    /// Recipe-specific options; these replace a context of the same name.
    #[serde(default)]
    pub options: Vec<OptionSpec>,

    /// Post-processing of the result table.
    #[serde(default)]
    pub output: OutputSpec,
}

/// Declarative post-processing steps, applied in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSpec {
    /// Columns to keep, in order; empty keeps all.
    pub columns: Vec<String>,

    /// Drop repeated rows.
    pub dedupe: bool,

    /// Column to sort by.
    pub sort_by: Option<String>,

    /// Sort in descending order.
    pub descending: bool,
}

impl RecipeDescriptor {
    /// Parses a descriptor; `source` names the file in error messages.
    pub fn from_toml_str(text: &str, source: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::invalid_definition(source, e.to_string()))
    }
}
