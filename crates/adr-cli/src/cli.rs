//! Command-line argument definitions.

use adr_core::OutputFormat;
use clap::{ArgAction, Parser, Subcommand};

/// adr - run ActiveData recipes
#[derive(Parser, Debug)]
#[command(name = "adr", version)]
#[command(
    about = "Run parameterized ActiveData queries (recipes) and print their results",
    long_about = None,
    after_help = "Run `adr list` to see the available recipes, and \
                  `adr <recipe> --help` for a recipe's options."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: table, json, csv, markdown
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// ActiveData query URL (overrides config)
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available recipes
    List,

    /// Run a recipe, passing everything after `--` to it
    Recipe {
        /// Recipe name
        name: String,

        /// Recipe options
        #[arg(last = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run a recipe by name: `adr <recipe> [options...]`
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,

    /// Get a configuration value by dotted key
    Get {
        /// Dotted key (e.g. `client.max_retries`)
        key: String,
    },

    /// Set a configuration value by dotted key
    Set {
        /// Dotted key (e.g. `app.port`)
        key: String,
        /// New value
        value: String,
    },

    /// Create a default configuration file
    Init {
        /// Write to this path instead of the default location
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// Recipe name and raw options, for the commands that run a recipe.
    pub fn recipe_invocation(&self) -> Option<(&str, &[String])> {
        match self {
            Command::Recipe { name, args } => Some((name.as_str(), args.as_slice())),
            Command::External(parts) => parts
                .split_first()
                .map(|(name, args)| (name.as_str(), args)),
            _ => None,
        }
    }
}
