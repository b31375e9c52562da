//! Recipe option definitions and the raw-argument parser.
//!
//! Each recipe declares an ordered list of [`OptionSpec`]s. The
//! [`OptionParser`] builds a [`clap::Command`] from them at runtime and
//! turns the raw strings that follow the recipe name on the command line
//! (or the query string of an `adr-app` request) into typed
//! [`RecipeOptions`]. Parse failures become [`Error::InvalidOption`] and
//! `-h`/`--help` becomes [`Error::Help`].
//!
//! # Example
//!
//! ```
//! use adr_core::options::{OptionParser, OptionSpec, OptionType};
//!
//! let specs = vec![
//!     OptionSpec::new("rev").with_flags(&["-r", "--rev"]).required(),
//!     OptionSpec::new("limit").with_type(OptionType::Integer).with_default(10),
//! ];
//!
//! let options = OptionParser::new("push_results", &specs)
//!     .parse(&["-rabcdef", "--limit=5"])
//!     .unwrap();
//! assert_eq!(options.get_str("rev"), Some("abcdef"));
//! assert_eq!(options.get_i64("limit"), Some(5));
//! ```

use crate::error::{Error, Result};
use clap::builder::{BoolishValueParser, PossibleValuesParser};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command, value_parser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Program name used in usage text.
pub const PROGRAM: &str = "adr";

// ============================================================================
// OptionType / OptionSpec
// ============================================================================

/// The kind of value an option accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// A single string value.
    #[default]
    String,
    /// A single signed integer.
    Integer,
    /// A single floating-point number.
    Number,
    /// A boolean switch; present means `true`, `--flag=false` turns it off.
    Flag,
    /// One or more string values.
    List,
}

/// Declaration of a single recipe option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Destination key; also the placeholder name in query templates.
    pub name: String,

    /// Command-line aliases (e.g. `-r`, `--rev`).
    ///
    /// Empty means `--<name>` with underscores replaced by dashes.
    #[serde(default)]
    pub flags: Vec<String>,

    /// Help text shown in usage.
    #[serde(default)]
    pub help: String,

    /// Value kind.
    #[serde(default, rename = "type")]
    pub option_type: OptionType,

    /// Value used when the option is absent.
    #[serde(default)]
    pub default: Option<Value>,

    /// Environment variable consulted before `default`.
    #[serde(default)]
    pub env: Option<String>,

    /// Allowed values (string and list options).
    #[serde(default)]
    pub choices: Vec<String>,

    /// Whether the option must resolve to a value.
    #[serde(default)]
    pub required: bool,

    /// Collect bare arguments into this (list) option.
    #[serde(default)]
    pub positional: bool,
}

impl OptionSpec {
    /// Creates a string option named `name` with default flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::new(),
            help: String::new(),
            option_type: OptionType::String,
            default: None,
            env: None,
            choices: Vec::new(),
            required: false,
            positional: false,
        }
    }

    /// Sets the command-line aliases.
    pub fn with_flags(mut self, flags: &[&str]) -> Self {
        self.flags = flags.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Sets the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Sets the value kind.
    pub fn with_type(mut self, option_type: OptionType) -> Self {
        self.option_type = option_type;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the environment variable consulted before the default.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Restricts values to `choices`.
    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Makes this list option collect bare arguments.
    pub fn positional(mut self) -> Self {
        self.option_type = OptionType::List;
        self.positional = true;
        self
    }

    /// The flags this option answers to.
    pub fn effective_flags(&self) -> Vec<String> {
        if self.flags.is_empty() && !self.positional {
            vec![format!("--{}", self.name.replace('_', "-"))]
        } else {
            self.flags.clone()
        }
    }

    /// The flag used when naming this option in messages.
    pub fn display_flag(&self) -> String {
        let flags = self.effective_flags();
        flags
            .iter()
            .find(|f| f.starts_with("--"))
            .or_else(|| flags.first())
            .cloned()
            .unwrap_or_else(|| self.metavar())
    }

    /// Placeholder shown for the option's value in usage text.
    pub fn metavar(&self) -> String {
        self.name.to_uppercase()
    }

    /// Builds the clap argument for this option.
    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).value_name(self.metavar());
        if !self.help.is_empty() {
            arg = arg.help(self.help.clone());
        }

        for flag in self.effective_flags() {
            arg = match parse_flag(&flag) {
                Some(FlagName::Short(c)) if arg.get_short().is_none() => arg.short(c),
                Some(FlagName::Short(c)) => arg.visible_short_alias(c),
                Some(FlagName::Long(long)) if arg.get_long().is_none() => arg.long(long.to_string()),
                Some(FlagName::Long(long)) => arg.visible_alias(long.to_string()),
                None => arg,
            };
        }

        arg = match self.option_type {
            OptionType::String => self.with_choices_parser(arg.action(ArgAction::Set)),
            OptionType::Integer => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
            OptionType::Number => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
            OptionType::Flag => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            OptionType::List => {
                let arg = self.with_choices_parser(arg.action(ArgAction::Append).num_args(1..));
                if self.env.is_some() {
                    arg.value_delimiter(',')
                } else {
                    arg
                }
            }
        };

        if let Some(var) = &self.env {
            arg = arg.env(var.clone());
        }

        match &self.default {
            Some(default) => arg.default_values(default_strings(default)),
            None if self.option_type == OptionType::Flag => arg.default_value("false"),
            None => arg.required(self.required),
        }
    }

    fn with_choices_parser(&self, arg: Arg) -> Arg {
        if self.choices.is_empty() {
            arg
        } else {
            arg.value_parser(PossibleValuesParser::new(self.choices.clone()))
        }
    }

    /// Reads this option's typed value out of parsed matches.
    fn extract(&self, matches: &ArgMatches) -> Option<Value> {
        let id = self.name.as_str();
        match self.option_type {
            OptionType::String => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .cloned()
                .map(Value::String),
            OptionType::Integer => matches
                .try_get_one::<i64>(id)
                .ok()
                .flatten()
                .copied()
                .map(Value::from),
            OptionType::Number => matches
                .try_get_one::<f64>(id)
                .ok()
                .flatten()
                .copied()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            OptionType::Flag => {
                let on = matches.try_get_one::<bool>(id).ok().flatten().copied();
                Some(Value::Bool(on.unwrap_or(false)))
            }
            OptionType::List => matches.try_get_many::<String>(id).ok().flatten().map(|items| {
                Value::Array(items.cloned().map(Value::String).collect())
            }),
        }
    }
}

/// A flag split into its short or long form.
enum FlagName<'a> {
    Short(char),
    Long(&'a str),
}

/// Parses `-x` or `--long-name`; anything else is malformed.
fn parse_flag(flag: &str) -> Option<FlagName<'_>> {
    if let Some(long) = flag.strip_prefix("--") {
        let mut chars = long.chars();
        let first = chars.next()?;
        let valid = first.is_ascii_alphanumeric()
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        return valid.then_some(FlagName::Long(long));
    }
    let mut chars = flag.strip_prefix('-')?.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(FlagName::Short(c)),
        _ => None,
    }
}

/// Matches the literals clap's boolish parser accepts.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// A declared default as the raw strings clap will parse.
fn default_strings(default: &Value) -> Vec<String> {
    let render = |value: &Value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match default {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(render).collect(),
        other => vec![render(other)],
    }
}

fn check_default(spec: &OptionSpec, default: &Value) -> std::result::Result<(), String> {
    let mismatch = || {
        format!(
            "default {default} does not match the type of option '{}'",
            spec.display_flag()
        )
    };
    let nested = |v: &Value| v.is_array() || v.is_object();
    match default {
        Value::Object(_) => return Err(mismatch()),
        Value::Array(items) if spec.option_type != OptionType::List || items.iter().any(nested) => {
            return Err(mismatch());
        }
        _ => {}
    }

    let values = default_strings(default);
    if spec.option_type != OptionType::List && values.len() != 1 {
        return Err(mismatch());
    }
    for value in &values {
        let parses = match spec.option_type {
            OptionType::String | OptionType::List => true,
            OptionType::Integer => value.trim().parse::<i64>().is_ok(),
            OptionType::Number => value.trim().parse::<f64>().is_ok(),
            OptionType::Flag => parse_bool(value).is_some(),
        };
        if !parses {
            return Err(mismatch());
        }
        if !spec.choices.is_empty() && !spec.choices.contains(value) {
            return Err(format!(
                "default '{value}' of option '{}' is not one of its choices",
                spec.display_flag()
            ));
        }
    }
    Ok(())
}

/// Checks a list of option specs for internal consistency.
///
/// Names must be non-empty and unique, flags must be `-x` or `--name` and
/// unique, `-h`/`--help` stay reserved, at most one list option may be
/// positional, choices only apply to string and list options, and defaults
/// must parse as their declared type.
pub fn validate_specs(recipe: &str, specs: &[OptionSpec]) -> Result<()> {
    let invalid = |message: String| Error::invalid_definition(recipe, message);
    let mut names = HashSet::new();
    let mut flags = HashSet::new();
    let mut positional = 0;

    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(invalid("option with empty name".to_string()));
        }
        if spec.name == "help" {
            return Err(invalid("option name 'help' is reserved".to_string()));
        }
        if !names.insert(spec.name.as_str()) {
            return Err(invalid(format!("option '{}' declared twice", spec.name)));
        }
        if spec.positional {
            if spec.option_type != OptionType::List {
                return Err(invalid(format!(
                    "positional option '{}' must be a list",
                    spec.name
                )));
            }
            if !spec.flags.is_empty() {
                return Err(invalid(format!(
                    "positional option '{}' cannot declare flags",
                    spec.name
                )));
            }
            positional += 1;
        }
        for flag in spec.effective_flags() {
            if flag == "-h" || flag == "--help" {
                return Err(invalid(format!("flag '{flag}' is reserved for help")));
            }
            if parse_flag(&flag).is_none() {
                return Err(invalid(format!(
                    "option '{}' has malformed flag '{flag}'",
                    spec.name
                )));
            }
            if !flags.insert(flag.clone()) {
                return Err(invalid(format!(
                    "flag '{flag}' is used by more than one option"
                )));
            }
        }
        if !spec.choices.is_empty()
            && !matches!(spec.option_type, OptionType::String | OptionType::List)
        {
            return Err(invalid(format!(
                "option '{}' declares choices but is not a string or list",
                spec.name
            )));
        }
        if let Some(default) = &spec.default {
            check_default(spec, default).map_err(invalid)?;
        }
    }

    if positional > 1 {
        return Err(invalid("at most one option may be positional".to_string()));
    }
    Ok(())
}

// ============================================================================
// RecipeOptions
// ============================================================================

/// Parsed, typed option values keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeOptions {
    values: BTreeMap<String, Value>,
}

impl RecipeOptions {
    /// Creates an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns whether `name` resolved to a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns a string value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns an integer value.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns a floating-point value.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns a flag value; absent flags are `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Returns a list value; absent lists are empty.
    pub fn get_list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Copies every value from `other`, replacing existing ones.
    pub fn merge(&mut self, other: &RecipeOptions) {
        self.values
            .extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of resolved options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no option resolved to a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// OptionParser
// ============================================================================

/// Parses raw option strings against a recipe's option specs.
///
/// Specs are expected to have passed [`validate_specs`]; the registry checks
/// them on registration.
#[derive(Debug, Clone, Copy)]
pub struct OptionParser<'a> {
    recipe: &'a str,
    description: &'a str,
    specs: &'a [OptionSpec],
}

impl<'a> OptionParser<'a> {
    /// Creates a parser for `recipe` with the given option specs.
    pub fn new(recipe: &'a str, specs: &'a [OptionSpec]) -> Self {
        Self {
            recipe,
            description: "",
            specs,
        }
    }

    /// Sets the description shown in usage text.
    pub fn with_description(mut self, description: &'a str) -> Self {
        self.description = description;
        self
    }

    /// Builds the clap command for the recipe.
    ///
    /// The command takes no binary name, so it parses exactly the strings
    /// that follow the recipe name.
    pub fn command(&self) -> Command {
        let template = if self.description.is_empty() {
            "usage: {usage}\n\n{all-args}"
        } else {
            "usage: {usage}\n\n{about-with-newline}\n{all-args}"
        };
        let command = Command::new(self.recipe.to_string())
            .bin_name(format!("{PROGRAM} {}", self.recipe))
            .about(self.description.to_string())
            .help_template(template)
            .no_binary_name(true)
            .disable_version_flag(true)
            .args_override_self(true)
            .color(ColorChoice::Never);
        self.specs
            .iter()
            .fold(command, |command, spec| command.arg(spec.to_arg()))
    }

    /// Renders usage text for the recipe.
    pub fn usage(&self) -> String {
        let mut text = self.command().render_help().to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }

    /// Parses `raw` into typed options.
    ///
    /// Fails with [`Error::InvalidOption`] on unknown flags, missing or
    /// malformed values, values outside `choices`, unexpected positional
    /// arguments, and required options that stay unresolved. Returns
    /// [`Error::Help`] when `-h` or `--help` is given as a flag.
    pub fn parse<S: AsRef<str>>(&self, raw: &[S]) -> Result<RecipeOptions> {
        let matches = self
            .command()
            .try_get_matches_from(raw.iter().map(|s| AsRef::<str>::as_ref(s)))
            .map_err(|err| self.clap_error(&err))?;
        Ok(self.collect(&matches))
    }

    /// Values the options resolve to with no arguments, from environment
    /// variables and defaults. Required options without either are left out.
    pub fn defaults(&self) -> Result<RecipeOptions> {
        let matches = self
            .command()
            .mut_args(|arg| arg.required(false))
            .try_get_matches_from(std::iter::empty::<&str>())
            .map_err(|err| self.clap_error(&err))?;
        Ok(self.collect(&matches))
    }

    fn collect(&self, matches: &ArgMatches) -> RecipeOptions {
        let values = self
            .specs
            .iter()
            .filter_map(|spec| Some((spec.name.clone(), spec.extract(matches)?)))
            .collect();
        RecipeOptions { values }
    }

    fn clap_error(&self, err: &clap::Error) -> Error {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Error::help(self.recipe, self.usage())
            }
            _ => Error::invalid_option(self.recipe, summarize(err), self.usage()),
        }
    }
}

/// Parses `raw` against `specs` for `recipe`.
pub fn parse_options<S: AsRef<str>>(
    recipe: &str,
    specs: &[OptionSpec],
    raw: &[S],
) -> Result<RecipeOptions> {
    OptionParser::new(recipe, specs).parse(raw)
}

/// First paragraph of a rendered clap error, on one line.
fn summarize(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches("error:").trim())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("rev")
                .with_flags(&["-r", "--rev"])
                .with_help("Revision of the push."),
            OptionSpec::new("branch")
                .with_flags(&["-B", "--branch"])
                .with_default("mozilla-central"),
            OptionSpec::new("limit").with_type(OptionType::Integer),
            OptionSpec::new("threshold").with_type(OptionType::Number),
            OptionSpec::new("clone").with_type(OptionType::Flag),
            OptionSpec::new("result")
                .with_type(OptionType::List)
                .with_choices(&["success", "testfailed", "busted"]),
        ]
    }

    fn parse(raw: &[&str]) -> Result<RecipeOptions> {
        let specs = specs();
        OptionParser::new("test", &specs).parse(raw)
    }

    fn invalid_message(err: Error) -> String {
        let Error::InvalidOption { message, .. } = err else {
            unreachable!("Expected InvalidOption error variant");
        };
        message
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_empty_uses_defaults() {
        let opts = parse(&[]).unwrap();
        assert_eq!(opts.get_str("branch"), Some("mozilla-central"));
        assert_eq!(opts.get("clone"), Some(&json!(false)));
        assert!(!opts.contains("rev"));
        assert!(!opts.contains("limit"));
        assert!(!opts.contains("result"));
    }

    #[test]
    fn test_parse_short_and_long_flags() {
        let opts = parse(&["-r", "abc123", "--branch", "autoland"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("abc123"));
        assert_eq!(opts.get_str("branch"), Some("autoland"));
    }

    #[test]
    fn test_parse_short_flag_with_attached_value() {
        let opts = parse(&["-rabc", "-Bautoland"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("abc"));
        assert_eq!(opts.get_str("branch"), Some("autoland"));
    }

    #[test]
    fn test_parse_inline_value() {
        let opts = parse(&["--rev=abc123", "--limit=20"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("abc123"));
        assert_eq!(opts.get_i64("limit"), Some(20));
    }

    #[test]
    fn test_parse_default_flag_for_underscored_name() {
        let specs = vec![OptionSpec::new("from_date")];
        let opts = parse_options("test", &specs, &["--from-date", "today-week"]).unwrap();
        assert_eq!(opts.get_str("from_date"), Some("today-week"));
    }

    #[test]
    fn test_parse_extra_long_flag_is_alias() {
        let specs = vec![OptionSpec::new("rev").with_flags(&["-r", "--rev", "--revision"])];
        let opts = parse_options("test", &specs, &["--revision", "abc"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("abc"));
    }

    #[test]
    fn test_parse_last_value_wins() {
        let opts = parse(&["-r", "one", "-r", "two"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("two"));
    }

    #[test]
    fn test_parse_number() {
        let opts = parse(&["--threshold", "0.5"]).unwrap();
        assert_eq!(opts.get_f64("threshold"), Some(0.5));
    }

    #[test]
    fn test_parse_negative_integer_value() {
        let opts = parse(&["--limit", "-3"]).unwrap();
        assert_eq!(opts.get_i64("limit"), Some(-3));
    }

    #[test]
    fn test_parse_dash_h_as_attached_value_is_not_help() {
        let opts = parse(&["--rev=-h"]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("-h"));
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_flag_presence() {
        let opts = parse(&["--clone"]).unwrap();
        assert!(opts.get_bool("clone"));
    }

    #[test]
    fn test_parse_flag_explicit_value() {
        assert!(!parse(&["--clone=false"]).unwrap().get_bool("clone"));
        assert!(parse(&["--clone=1"]).unwrap().get_bool("clone"));
        let err = parse(&["--clone=maybe"]).unwrap_err();
        assert!(invalid_message(err).contains("invalid value 'maybe'"));
    }

    #[test]
    fn test_parse_flag_does_not_consume_next_argument() {
        let opts = parse(&["--clone", "-r", "abc"]).unwrap();
        assert!(opts.get_bool("clone"));
        assert_eq!(opts.get_str("rev"), Some("abc"));
    }

    // ------------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_list_consumes_until_next_flag() {
        let opts = parse(&["--result", "success", "busted", "-r", "abc"]).unwrap();
        assert_eq!(opts.get_list("result"), vec!["success", "busted"]);
        assert_eq!(opts.get_str("rev"), Some("abc"));
    }

    #[test]
    fn test_parse_list_repeated_and_inline() {
        let opts = parse(&["--result=success", "--result", "testfailed"]).unwrap();
        assert_eq!(opts.get_list("result"), vec!["success", "testfailed"]);
    }

    #[test]
    fn test_parse_list_requires_value() {
        let err = parse(&["--result", "--clone"]).unwrap_err();
        assert!(invalid_message(err).contains("a value is required for '--result"));
    }

    #[test]
    fn test_parse_list_choices_enforced() {
        let err = parse(&["--result", "exploded"]).unwrap_err();
        let message = invalid_message(err);
        assert!(message.contains("invalid value 'exploded'"));
        assert!(message.contains("success, testfailed, busted"));
    }

    #[test]
    fn test_parse_positional_list() {
        let specs = vec![
            OptionSpec::new("strategies").positional(),
            OptionSpec::new("clone").with_type(OptionType::Flag),
        ];
        let opts = parse_options("test", &specs, &["seta", "--clone", "never"]).unwrap();
        assert_eq!(opts.get_list("strategies"), vec!["seta", "never"]);
        assert!(opts.get_bool("clone"));
    }

    #[test]
    fn test_parse_double_dash_forces_positional() {
        let specs = vec![OptionSpec::new("paths").positional()];
        let opts = parse_options("test", &specs, &["--", "--not-a-flag"]).unwrap();
        assert_eq!(opts.get_list("paths"), vec!["--not-a-flag"]);
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_unrecognized_flag() {
        let err = parse(&["--bogus"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let Error::InvalidOption {
            recipe,
            message,
            usage,
        } = err
        else {
            unreachable!("Expected InvalidOption error variant");
        };
        assert_eq!(recipe, "test");
        assert_eq!(message, "unexpected argument '--bogus' found");
        assert!(usage.starts_with("usage: adr test"));
    }

    #[test]
    fn test_parse_missing_value() {
        let err = parse(&["--rev"]).unwrap_err();
        assert!(invalid_message(err).contains("a value is required for '--rev <REV>'"));
    }

    #[test]
    fn test_parse_malformed_integer() {
        let err = parse(&["--limit", "ten"]).unwrap_err();
        assert!(invalid_message(err).contains("invalid value 'ten' for '--limit <LIMIT>'"));
    }

    #[test]
    fn test_parse_unexpected_positional() {
        let err = parse(&["stray"]).unwrap_err();
        assert!(invalid_message(err).contains("unexpected argument 'stray'"));
    }

    #[test]
    fn test_parse_missing_required() {
        let specs = vec![OptionSpec::new("rev").with_flags(&["-r", "--rev"]).required()];
        let err = parse_options::<&str>("test", &specs, &[]).unwrap_err();
        assert_eq!(
            invalid_message(err),
            "the following required arguments were not provided: --rev <REV>"
        );
    }

    #[test]
    fn test_parse_required_satisfied_by_default() {
        let specs = vec![OptionSpec::new("rev").required().with_default("tip")];
        let opts = parse_options::<&str>("test", &specs, &[]).unwrap();
        assert_eq!(opts.get_str("rev"), Some("tip"));
    }

    #[test]
    fn test_parse_help_flag() {
        for flag in ["-h", "--help"] {
            let err = parse(&["-r", "abc", flag]).unwrap_err();
            assert_eq!(err.exit_code(), 0);
            let Error::Help { recipe, usage } = err else {
                unreachable!("Expected Help variant");
            };
            assert_eq!(recipe, "test");
            assert!(usage.starts_with("usage: adr test"));
        }
    }

    #[test]
    fn test_parse_env_before_default() {
        // cargo exports CARGO_PKG_NAME to the test process.
        let specs = vec![OptionSpec::new("package")
            .with_env("CARGO_PKG_NAME")
            .with_default("from-default")];
        let opts = parse_options::<&str>("test", &specs, &[]).unwrap();
        assert_eq!(opts.get_str("package"), Some("adr-core"));
    }

    #[test]
    fn test_parse_unset_env_falls_back_to_default() {
        let specs = vec![OptionSpec::new("path")
            .with_env("ADR_TEST_VARIABLE_THAT_IS_NEVER_SET")
            .with_default("from-default")];
        let opts = parse_options::<&str>("test", &specs, &[]).unwrap();
        assert_eq!(opts.get_str("path"), Some("from-default"));
    }

    #[test]
    fn test_parse_list_default_string_normalized() {
        let specs = vec![OptionSpec::new("labels")
            .with_type(OptionType::List)
            .with_default("test-linux")];
        let opts = parse_options::<&str>("test", &specs, &[]).unwrap();
        assert_eq!(opts.get("labels"), Some(&json!(["test-linux"])));
    }

    #[test]
    fn test_parse_typed_defaults() {
        let specs = vec![
            OptionSpec::new("limit")
                .with_type(OptionType::Integer)
                .with_default(10),
            OptionSpec::new("ratio")
                .with_type(OptionType::Number)
                .with_default(0.25),
            OptionSpec::new("clone")
                .with_type(OptionType::Flag)
                .with_default(true),
        ];
        let opts = parse_options::<&str>("test", &specs, &[]).unwrap();
        assert_eq!(opts.get("limit"), Some(&json!(10)));
        assert_eq!(opts.get_f64("ratio"), Some(0.25));
        assert!(opts.get_bool("clone"));
    }

    #[test]
    fn test_defaults_skip_required() {
        let mut specs = specs();
        specs[0] = specs[0].clone().required();
        let opts = OptionParser::new("test", &specs).defaults().unwrap();
        assert!(!opts.contains("rev"));
        assert_eq!(opts.get_str("branch"), Some("mozilla-central"));
        assert!(!opts.get_bool("clone"));
    }

    #[test]
    fn test_merge_replaces_values() {
        let mut base = RecipeOptions::new();
        base.insert("branch", "mozilla-central");
        base.insert("limit", 10);
        let mut given = RecipeOptions::new();
        given.insert("branch", "autoland");
        base.merge(&given);
        assert_eq!(base.get_str("branch"), Some("autoland"));
        assert_eq!(base.get_i64("limit"), Some(10));
    }

    // ------------------------------------------------------------------------
    // validate_specs
    // ------------------------------------------------------------------------

    #[test]
    fn test_validate_specs_ok() {
        assert!(validate_specs("test", &specs()).is_ok());
    }

    #[test]
    fn test_validate_specs_duplicate_name() {
        let specs = vec![OptionSpec::new("rev"), OptionSpec::new("rev")];
        let err = validate_specs("test", &specs).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_validate_specs_duplicate_flag() {
        let specs = vec![
            OptionSpec::new("rev").with_flags(&["-r"]),
            OptionSpec::new("repo").with_flags(&["-r"]),
        ];
        let err = validate_specs("test", &specs).unwrap_err();
        assert!(err.to_string().contains("flag '-r'"));
    }

    #[test]
    fn test_validate_specs_bad_default_type() {
        let specs = vec![OptionSpec::new("limit")
            .with_type(OptionType::Integer)
            .with_default(true)];
        assert!(matches!(
            validate_specs("test", &specs),
            Err(Error::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_validate_specs_default_outside_choices() {
        let specs = vec![OptionSpec::new("result")
            .with_choices(&["success", "busted"])
            .with_default("exploded")];
        let err = validate_specs("test", &specs).unwrap_err();
        assert!(err.to_string().contains("not one of its choices"));
    }

    #[test]
    fn test_validate_specs_malformed_flags() {
        for flag in ["rev", "-rev", "--", "---rev", "--rev=x", "-1"] {
            let specs = vec![OptionSpec::new("rev").with_flags(&[flag])];
            assert!(validate_specs("test", &specs).is_err(), "{flag} accepted");
        }
    }

    #[test]
    fn test_validate_specs_help_is_reserved() {
        for flag in ["-h", "--help"] {
            let specs = vec![OptionSpec::new("host").with_flags(&[flag])];
            let err = validate_specs("test", &specs).unwrap_err();
            assert!(err.to_string().contains("reserved for help"));
        }
        assert!(validate_specs("test", &[OptionSpec::new("help")]).is_err());
    }

    #[test]
    fn test_validate_specs_choices_on_integer() {
        let specs = vec![OptionSpec::new("limit")
            .with_type(OptionType::Integer)
            .with_choices(&["1", "2"])];
        assert!(validate_specs("test", &specs).is_err());
    }

    #[test]
    fn test_validate_specs_positional_rules() {
        let two = vec![
            OptionSpec::new("a").positional(),
            OptionSpec::new("b").positional(),
        ];
        assert!(validate_specs("test", &two).is_err());

        let flagged = vec![OptionSpec::new("a").positional().with_flags(&["--a"])];
        assert!(validate_specs("test", &flagged).is_err());
    }

    // ------------------------------------------------------------------------
    // usage
    // ------------------------------------------------------------------------

    #[test]
    fn test_usage_lists_options() {
        let specs = specs();
        let text = OptionParser::new("push_results", &specs)
            .with_description("Show task results.")
            .usage();
        assert!(text.starts_with("usage: adr push_results"));
        assert!(text.contains("Show task results."));
        assert!(text.contains("-r, --rev <REV>"));
        assert!(text.contains("Revision of the push."));
        assert!(text.contains("[default: mozilla-central]"));
        assert!(text.contains("[possible values: success, testfailed, busted]"));
        assert!(text.contains("--clone"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_usage_shows_required_in_synopsis() {
        let specs = vec![OptionSpec::new("rev").with_flags(&["-r", "--rev"]).required()];
        let text = OptionParser::new("push_results", &specs).usage();
        let synopsis = text.lines().next().unwrap();
        assert!(synopsis.starts_with("usage: adr push_results"));
        assert!(synopsis.contains("--rev <REV>"));
    }

    #[test]
    fn test_usage_without_options() {
        let text = OptionParser::new("noop", &[]).usage();
        assert!(text.starts_with("usage: adr noop"));
        assert!(!text.contains("Options:\n  -r"));
    }

    #[test]
    fn test_recipe_options_accessors() {
        let mut opts = RecipeOptions::new();
        assert!(opts.is_empty());
        opts.insert("rev", "abc");
        opts.insert("limit", 3);
        assert_eq!(opts.len(), 2);
        assert_eq!(opts.get_str("rev"), Some("abc"));
        assert_eq!(opts.get_i64("limit"), Some(3));
        assert_eq!(opts.get_list("rev"), vec!["abc"]);
        let names: Vec<_> = opts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["limit", "rev"]);
    }
}
