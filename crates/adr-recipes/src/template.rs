//! Query templates and the [`TemplateRecipe`] built from a descriptor.
//!
//! A template is a JSON document whose strings may hold `{{name}}`
//! placeholders naming recipe options:
//!
//! - a string that is exactly one placeholder becomes the option's typed
//!   value; when the option is absent, the enclosing object entry or array
//!   element is dropped (and an object or array left empty by drops is
//!   dropped in turn)
//! - a placeholder inside a longer string is replaced by the value's text;
//!   the option must then have a value

use crate::contexts::{CONTEXT_NAMES, shared_context};
use crate::descriptor::{OutputSpec, RecipeDescriptor};
use adr_core::output::cell_text;
use adr_core::{
    Error, OptionSpec, Output, Query, QueryResult, Recipe, RecipeContext, RecipeOptions, Result,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

// ============================================================================
// Placeholder scanning
// ============================================================================

/// A piece of a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a string into literal text and placeholders.
///
/// Brace pairs that do not enclose a valid name are kept as text.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };
        let name = after_open[..close].trim();
        if is_placeholder_name(name) {
            if open > 0 {
                out.push(Segment::Text(&rest[..open]));
            }
            out.push(Segment::Placeholder(name));
        } else {
            out.push(Segment::Text(&rest[..open + OPEN.len() + close + CLOSE.len()]));
        }
        rest = &after_open[close + CLOSE.len()..];
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

/// Every placeholder name used anywhere in `template`.
pub fn placeholders(template: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_placeholders(template, &mut names);
    names
}

fn collect_placeholders(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for segment in segments(s) {
                if let Segment::Placeholder(name) = segment {
                    names.insert(name.to_string());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, names)),
        _ => {}
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Substitutes option values into `template`.
///
/// Returns `Ok(None)` when the whole template was dropped. `Err` carries the
/// name of a placeholder that needed text but had no value.
pub fn render(
    template: &Value,
    options: &RecipeOptions,
) -> std::result::Result<Option<Value>, String> {
    match template {
        Value::String(s) => render_string(s, options),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = render(item, options)? {
                    out.push(v);
                }
            }
            if out.is_empty() && !items.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::Array(out)))
            }
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                if let Some(v) = render(item, options)? {
                    out.insert(key.clone(), v);
                }
            }
            if out.is_empty() && !map.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::Object(out)))
            }
        }
        other => Ok(Some(other.clone())),
    }
}

fn render_string(
    text: &str,
    options: &RecipeOptions,
) -> std::result::Result<Option<Value>, String> {
    let parts = segments(text);
    if let [Segment::Placeholder(name)] = parts.as_slice() {
        return Ok(options.get(name).cloned());
    }

    let mut out = String::with_capacity(text.len());
    for part in parts {
        match part {
            Segment::Text(t) => out.push_str(t),
            Segment::Placeholder(name) => {
                let value = options.get(name).ok_or_else(|| name.to_string())?;
                out.push_str(&cell_text(value));
            }
        }
    }
    Ok(Some(Value::String(out)))
}

// ============================================================================
// TemplateRecipe
// ============================================================================

/// A recipe defined entirely by a query template and output steps.
#[derive(Debug, Clone)]
pub struct TemplateRecipe {
    name: String,
    description: String,
    options: Vec<OptionSpec>,
    template: Value,
    output: OutputSpec,
}

impl TemplateRecipe {
    /// Builds a recipe from a descriptor.
    ///
    /// Resolves contexts, parses the query JSON, and checks that every
    /// placeholder names an option.
    pub fn from_descriptor(descriptor: RecipeDescriptor) -> Result<Self> {
        let RecipeDescriptor {
            name,
            description,
            contexts,
            query,
            options,
            output,
        } = descriptor;

        let mut specs = Vec::new();
        for context in &contexts {
            let spec = shared_context(context).ok_or_else(|| {
                Error::invalid_definition(
                    &name,
                    format!(
                        "unknown context '{context}' (known: {})",
                        CONTEXT_NAMES.join(", ")
                    ),
                )
            })?;
            if !options.iter().any(|o| o.name == spec.name) {
                specs.push(spec);
            }
        }
        specs.extend(options);

        let template: Value = serde_json::from_str(&query).map_err(|e| {
            Error::invalid_definition(&name, format!("query is not valid JSON: {e}"))
        })?;

        let unknown: Vec<String> = placeholders(&template)
            .into_iter()
            .filter(|p| !specs.iter().any(|s| &s.name == p))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::invalid_definition(
                &name,
                format!("query uses undefined placeholders: {}", unknown.join(", ")),
            ));
        }

        Ok(Self {
            name,
            description,
            options: specs,
            template,
            output,
        })
    }

    /// The unrendered query template.
    pub fn template(&self) -> &Value {
        &self.template
    }

    /// Output post-processing steps.
    pub fn output_spec(&self) -> &OutputSpec {
        &self.output
    }
}

#[async_trait]
impl Recipe for TemplateRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    fn query(&self, options: &RecipeOptions) -> Result<Query> {
        let body = render(&self.template, options).map_err(|name| {
            Error::invalid_option(
                &self.name,
                format!("option '{name}' needs a value"),
                self.usage(),
            )
        })?;
        Ok(Query::new(&self.name, body.unwrap_or(Value::Null)))
    }

    async fn postprocess(
        &self,
        _ctx: &RecipeContext<'_>,
        _options: &RecipeOptions,
        result: QueryResult,
    ) -> Result<Output> {
        let mut output = Output::from_query_result(result)?;
        if !self.output.columns.is_empty() {
            output = output.select_columns(&self.output.columns)?;
        }
        if self.output.dedupe {
            output = output.dedupe();
        }
        if let Some(column) = &self.output.sort_by {
            output = output.sort_by_column(column, self.output.descending)?;
        }
        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adr_core::{MockQueryClient, OptionParser, RecipeRegistry};
    use serde_json::json;

    fn options(pairs: &[(&str, Value)]) -> RecipeOptions {
        let mut opts = RecipeOptions::new();
        for (k, v) in pairs {
            opts.insert(*k, v.clone());
        }
        opts
    }

    fn descriptor(query: &str) -> RecipeDescriptor {
        RecipeDescriptor {
            name: "example".to_string(),
            description: "Example recipe.".to_string(),
            contexts: vec!["branch".to_string(), "limit".to_string()],
            query: query.to_string(),
            options: vec![OptionSpec::new("label")],
            output: OutputSpec::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------------

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("repo {{ branch }} at {{rev}}"),
            vec![
                Segment::Text("repo "),
                Segment::Placeholder("branch"),
                Segment::Text(" at "),
                Segment::Placeholder("rev"),
            ]
        );
    }

    #[test]
    fn test_segments_ignores_non_names() {
        assert_eq!(segments("{{not a name}}"), vec![Segment::Text("{{not a name}}")]);
        assert_eq!(segments("open {{rev"), vec![Segment::Text("open {{rev")]);
    }

    #[test]
    fn test_placeholders_collects_nested() {
        let template = json!({
            "from": "task",
            "where": {"and": [{"eq": {"branch": "{{branch}}"}}, {"prefix": {"label": "test-{{kind}}"}}]},
            "limit": "{{limit}}"
        });
        let names: Vec<_> = placeholders(&template).into_iter().collect();
        assert_eq!(names, vec!["branch", "kind", "limit"]);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    #[test]
    fn test_exact_placeholder_keeps_type() {
        let rendered = render(
            &json!({"limit": "{{limit}}", "labels": "{{labels}}"}),
            &options(&[("limit", json!(5)), ("labels", json!(["a", "b"]))]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(rendered, json!({"limit": 5, "labels": ["a", "b"]}));
    }

    #[test]
    fn test_inline_placeholder_interpolates_text() {
        let rendered = render(
            &json!("{{branch}}/rev/{{rev}}"),
            &options(&[("branch", json!("autoland")), ("rev", json!("abc"))]),
        )
        .unwrap();
        assert_eq!(rendered, Some(json!("autoland/rev/abc")));
    }

    #[test]
    fn test_absent_exact_placeholder_drops_entry() {
        let rendered = render(
            &json!({"from": "task", "limit": "{{limit}}"}),
            &RecipeOptions::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(rendered, json!({"from": "task"}));
    }

    #[test]
    fn test_drops_propagate_through_emptied_containers() {
        let template = json!({
            "where": {"and": [
                {"eq": {"branch": "{{branch}}"}},
                {"eq": {"result": "{{result}}"}}
            ]}
        });
        let rendered = render(&template, &options(&[("branch", json!("autoland"))]))
            .unwrap()
            .unwrap();
        assert_eq!(
            rendered,
            json!({"where": {"and": [{"eq": {"branch": "autoland"}}]}})
        );
    }

    #[test]
    fn test_literal_empty_containers_survive() {
        let rendered = render(&json!({"select": [], "where": {}}), &RecipeOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(rendered, json!({"select": [], "where": {}}));
    }

    #[test]
    fn test_absent_inline_placeholder_errors() {
        let err = render(&json!("test-{{kind}}"), &RecipeOptions::new()).unwrap_err();
        assert_eq!(err, "kind");
    }

    // ------------------------------------------------------------------------
    // TemplateRecipe
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_descriptor_merges_contexts() {
        let recipe = TemplateRecipe::from_descriptor(descriptor(
            r#"{"from": "task", "limit": "{{limit}}", "where": {"eq": {"branch": "{{branch}}", "label": "{{label}}"}}}"#,
        ))
        .unwrap();
        let names: Vec<_> = recipe.options().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["branch", "limit", "label"]);
    }

    #[test]
    fn test_own_option_replaces_context() {
        let mut desc = descriptor(r#"{"limit": "{{limit}}"}"#);
        desc.options = vec![OptionSpec::new("limit").with_default("5")];
        let recipe = TemplateRecipe::from_descriptor(desc).unwrap();
        let limit: Vec<_> = recipe.options().iter().filter(|o| o.name == "limit").collect();
        assert_eq!(limit.len(), 1);
        assert_eq!(limit[0].default, Some(json!("5")));
    }

    #[test]
    fn test_undefined_placeholder_rejected() {
        let err = TemplateRecipe::from_descriptor(descriptor(r#"{"rev": "{{rev}}"}"#)).unwrap_err();
        assert!(err.to_string().contains("undefined placeholders: rev"));
    }

    #[test]
    fn test_unknown_context_rejected() {
        let mut desc = descriptor("{}");
        desc.contexts.push("gecko_path".to_string());
        let err = TemplateRecipe::from_descriptor(desc).unwrap_err();
        assert!(err.to_string().contains("unknown context 'gecko_path'"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = TemplateRecipe::from_descriptor(descriptor("{from: task}")).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn test_query_renders_parsed_options() {
        let recipe = TemplateRecipe::from_descriptor(descriptor(
            r#"{"from": "task", "limit": "{{limit}}", "where": {"eq": {"branch": "{{branch}}", "label": "{{label}}"}}}"#,
        ))
        .unwrap();
        let opts = OptionParser::new(recipe.name(), recipe.options())
            .parse(&["-B", "autoland", "--limit", "3"])
            .unwrap();
        let query = recipe.query(&opts).unwrap();
        assert_eq!(query.name, "example");
        assert_eq!(
            query.body,
            json!({"from": "task", "limit": 3, "where": {"eq": {"branch": "autoland"}}})
        );
    }

    #[test]
    fn test_query_missing_inline_value_is_invalid_option() {
        let recipe =
            TemplateRecipe::from_descriptor(descriptor(r#"{"prefix": "test-{{label}}"}"#)).unwrap();
        let err = recipe.query(&RecipeOptions::new()).unwrap_err();
        let Error::InvalidOption { message, usage, .. } = err else {
            unreachable!("Expected InvalidOption error variant");
        };
        assert_eq!(message, "option 'label' needs a value");
        assert!(usage.starts_with("usage: adr example"));
    }

    #[tokio::test]
    async fn test_postprocess_applies_output_steps() {
        let mut desc = descriptor("{}");
        desc.output = OutputSpec {
            columns: vec!["label".to_string(), "duration".to_string()],
            dedupe: true,
            sort_by: Some("duration".to_string()),
            descending: true,
        };
        let recipe = TemplateRecipe::from_descriptor(desc).unwrap();
        let client = MockQueryClient::default();
        let registry = RecipeRegistry::new();
        let result = QueryResult::from_data(json!([
            {"label": "a", "duration": 1, "state": "completed"},
            {"label": "b", "duration": 9, "state": "completed"},
            {"label": "a", "duration": 1, "state": "failed"},
        ]));

        let output = recipe
            .postprocess(
                &RecipeContext::new(&registry, &client),
                &RecipeOptions::new(),
                result,
            )
            .await
            .unwrap();

        assert_eq!(output.header, vec!["label", "duration"]);
        assert_eq!(
            output.rows,
            vec![vec![json!("b"), json!(9)], vec![json!("a"), json!(1)]]
        );
    }
}
