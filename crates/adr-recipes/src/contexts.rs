//! Shared option definitions ("contexts") that descriptors include by name.

use adr_core::{OptionSpec, OptionType};

/// Every known context name, sorted.
pub const CONTEXT_NAMES: [&str; 5] = ["branch", "from_date", "limit", "rev", "to_date"];

/// The option definition for a context, if `name` is known.
pub fn shared_context(name: &str) -> Option<OptionSpec> {
    let spec = match name {
        "branch" => OptionSpec::new("branch")
            .with_flags(&["-B", "--branch"])
            .with_default("mozilla-central")
            .with_help("Branch to query"),
        "from_date" => OptionSpec::new("from_date")
            .with_flags(&["--from"])
            .with_default("today-week")
            .with_help("Starting date (inclusive)"),
        "to_date" => OptionSpec::new("to_date")
            .with_flags(&["--to"])
            .with_default("eod")
            .with_help("Ending date (exclusive)"),
        "rev" => OptionSpec::new("rev")
            .with_flags(&["-r", "--revision"])
            .with_help("Push revision (12 or 40 characters)")
            .required(),
        "limit" => OptionSpec::new("limit")
            .with_type(OptionType::Integer)
            .with_default(10000)
            .with_help("Maximum number of records to return"),
        _ => return None,
    };
    Some(spec)
}
