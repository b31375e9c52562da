//! Error types for the adr core library.

/// Errors that can occur while building the registry or running a recipe.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Recipe name not present in the registry.
    #[error("{}", unknown_recipe_message(.name, .available, .suggestion))]
    UnknownRecipe {
        /// Name that was requested
        name: String,
        /// Every registered name, sorted
        available: Vec<String>,
        /// Closest registered name, if any is close enough
        suggestion: Option<String>,
    },

    /// Malformed or unrecognized recipe option.
    #[error("Invalid option for recipe '{recipe}': {message}")]
    InvalidOption {
        /// Recipe whose options were being parsed
        recipe: String,
        /// What went wrong
        message: String,
        /// Usage text for the recipe
        usage: String,
    },

    /// `-h` or `--help` appeared among a recipe's options.
    ///
    /// Not a failure: callers print `usage` and exit successfully.
    #[error("Help requested for recipe '{recipe}'")]
    Help {
        /// Recipe whose help was requested
        recipe: String,
        /// Usage text for the recipe
        usage: String,
    },

    /// Two recipes registered under one name.
    #[error("Duplicate recipe: '{name}' is already registered")]
    DuplicateRecipe {
        /// The conflicting name
        name: String,
    },

    /// A recipe definition is malformed.
    #[error("Invalid definition for recipe '{recipe}': {message}")]
    InvalidDefinition {
        /// Recipe (or descriptor source) that failed validation
        recipe: String,
        /// What went wrong
        message: String,
    },

    /// The query backend failed or returned an error.
    #[error("Query error: {message}")]
    Query {
        /// Human-readable error message
        message: String,
        /// HTTP status, when the backend answered
        status: Option<u16>,
        /// Whether retrying the same query may succeed
        retryable: bool,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias for adr operations.
pub type Result<T> = std::result::Result<T, Error>;

fn unknown_recipe_message(name: &str, available: &[String], suggestion: &Option<String>) -> String {
    let mut msg = format!("Unknown recipe: '{name}'");
    if let Some(s) = suggestion {
        msg.push_str(&format!(" (did you mean '{s}'?)"));
    }
    if available.is_empty() {
        msg.push_str(". No recipes are registered.");
    } else {
        msg.push_str(&format!(". Available recipes: {}", available.join(", ")));
    }
    msg
}

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Only backend failures flagged as transient (timeouts, connection
    /// failures, 5xx and 429 responses) are retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Query { retryable, .. } => *retryable,
            Error::Io(_) => true,
            Error::UnknownRecipe { .. } => false,
            Error::InvalidOption { .. } => false,
            Error::Help { .. } => false,
            Error::DuplicateRecipe { .. } => false,
            Error::InvalidDefinition { .. } => false,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
        }
    }

    /// Process exit code for this error.
    ///
    /// Usage errors (unknown recipe, invalid option) exit with 2, a help
    /// request with 0, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Help { .. } => 0,
            Error::UnknownRecipe { .. } | Error::InvalidOption { .. } => 2,
            _ => 1,
        }
    }

    /// Creates an unknown-recipe error, suggesting the closest available name.
    pub fn unknown_recipe<S: Into<String>>(name: S, available: Vec<String>) -> Self {
        let name = name.into();
        let suggestion = closest_name(&name, &available);
        Error::UnknownRecipe {
            name,
            available,
            suggestion,
        }
    }

    /// Creates a help request carrying the recipe's usage text.
    pub fn help(recipe: impl Into<String>, usage: impl Into<String>) -> Self {
        Error::Help {
            recipe: recipe.into(),
            usage: usage.into(),
        }
    }

    /// Creates an invalid-option error.
    pub fn invalid_option<R, M, U>(recipe: R, message: M, usage: U) -> Self
    where
        R: Into<String>,
        M: Into<String>,
        U: Into<String>,
    {
        Error::InvalidOption {
            recipe: recipe.into(),
            message: message.into(),
            usage: usage.into(),
        }
    }

    /// Creates an invalid-definition error.
    pub fn invalid_definition<R: Into<String>, M: Into<String>>(recipe: R, message: M) -> Self {
        Error::InvalidDefinition {
            recipe: recipe.into(),
            message: message.into(),
        }
    }

    /// Creates a non-retryable query error with a message.
    pub fn query<S: Into<String>>(message: S) -> Self {
        Error::Query {
            message: message.into(),
            status: None,
            retryable: false,
            source: None,
        }
    }

    /// Creates a query error with a message and source error.
    pub fn query_with_source<S, E>(message: S, retryable: bool, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Query {
            message: message.into(),
            status: None,
            retryable,
            source: Some(Box::new(source)),
        }
    }

    /// Creates a query error for an HTTP status returned by the backend.
    pub fn query_status<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Query {
            message: message.into(),
            status: Some(status),
            retryable: status == 429 || status >= 500,
            source: None,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

/// Pick the registered name closest to `name`, if it is reasonably similar.
fn closest_name(name: &str, available: &[String]) -> Option<String> {
    available
        .iter()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_recipe_lists_available() {
        let err = Error::unknown_recipe("nope", vec!["a".into(), "b".into()]);
        assert_eq!(
            err.to_string(),
            "Unknown recipe: 'nope'. Available recipes: a, b"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_recipe_suggests_close_name() {
        let err = Error::unknown_recipe(
            "push_result",
            vec!["push_results".into(), "task_durations".into()],
        );
        let Error::UnknownRecipe { suggestion, .. } = &err else {
            unreachable!("Expected UnknownRecipe error variant");
        };
        assert_eq!(suggestion.as_deref(), Some("push_results"));
        assert!(err.to_string().contains("did you mean 'push_results'?"));
    }

    #[test]
    fn test_unknown_recipe_empty_registry() {
        let err = Error::unknown_recipe("x", vec![]);
        assert!(err.to_string().contains("No recipes are registered"));
    }

    #[test]
    fn test_invalid_option_display() {
        let err = Error::invalid_option(
            "push_results",
            "unexpected argument '--bogus' found",
            "usage",
        );
        assert_eq!(
            err.to_string(),
            "Invalid option for recipe 'push_results': unexpected argument '--bogus' found"
        );
        assert_eq!(err.exit_code(), 2);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_help_exits_successfully() {
        let err = Error::help("push_results", "usage: adr push_results\n");
        assert_eq!(err.exit_code(), 0);
        assert!(!err.is_retryable());
        let Error::Help { usage, .. } = err else {
            unreachable!("Expected Help variant");
        };
        assert_eq!(usage, "usage: adr push_results\n");
    }

    #[test]
    fn test_duplicate_recipe_display() {
        let err = Error::DuplicateRecipe {
            name: "push_results".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate recipe: 'push_results' is already registered"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_query_status_retryable_classification() {
        assert!(Error::query_status(503, "unavailable").is_retryable());
        assert!(Error::query_status(429, "slow down").is_retryable());
        assert!(!Error::query_status(400, "bad query").is_retryable());
        assert!(!Error::query("boom").is_retryable());
    }

    #[test]
    fn test_query_with_source() {
        let io_error = std::io::Error::other("network failure");
        let err = Error::query_with_source("request failed", true, io_error);
        assert!(err.to_string().contains("request failed"));
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("bad url");
        assert_eq!(err.to_string(), "Configuration error: bad url");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_serde_error_not_retryable() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = serde_err.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
