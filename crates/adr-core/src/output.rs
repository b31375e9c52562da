//! Recipe output tables and their renderers.

use crate::error::{Error, Result};
use crate::query::QueryResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A row as a JSON array literal.
fn row_key(row: &[Value]) -> String {
    let cells: Vec<String> = row.iter().map(Value::to_string).collect();
    format!("[{}]", cells.join(","))
}

/// Tabular recipe output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Column names.
    pub header: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<Value>>,
}

impl Output {
    /// Creates an output table.
    pub fn new(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { header, rows }
    }

    /// Converts a backend result into a table.
    ///
    /// - `header` + array rows: used as-is (scalar rows become one-cell rows)
    /// - array of objects: header is every key in first-seen order
    /// - a single object: one row
    /// - an array of scalars or a scalar: a single `result` column
    pub fn from_query_result(result: QueryResult) -> Result<Self> {
        if let Some(header) = result.header {
            let rows = match result.data {
                Value::Array(rows) => rows
                    .into_iter()
                    .map(|row| match row {
                        Value::Array(cells) => cells,
                        other => vec![other],
                    })
                    .collect(),
                Value::Null => Vec::new(),
                other => {
                    return Err(Error::query(format!(
                        "table result has non-array data: {}",
                        type_name(&other)
                    )));
                }
            };
            return Ok(Self { header, rows });
        }

        match result.data {
            Value::Null => Ok(Self::default()),
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                let objects: Vec<Map<String, Value>> = items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect();
                Ok(Self::from_objects(objects))
            }
            Value::Array(items) => Ok(Self {
                header: vec!["result".to_string()],
                rows: items.into_iter().map(|v| vec![v]).collect(),
            }),
            Value::Object(map) => Ok(Self::from_objects(vec![map])),
            scalar => Ok(Self {
                header: vec!["result".to_string()],
                rows: vec![vec![scalar]],
            }),
        }
    }

    fn from_objects(objects: Vec<Map<String, Value>>) -> Self {
        let mut header: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !header.contains(key) {
                    header.push(key.clone());
                }
            }
        }
        let rows = objects
            .into_iter()
            .map(|mut object| {
                header
                    .iter()
                    .map(|key| object.remove(key).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    /// Index of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Keeps only the named columns, in the given order.
    pub fn select_columns(self, columns: &[String]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c).ok_or_else(|| {
                    Error::query(format!(
                        "column '{c}' not present in result (have: {})",
                        self.header.join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Ok(Self {
            header: columns.to_vec(),
            rows,
        })
    }

    /// Stable sort by a column; numbers sort numerically, nulls first.
    pub fn sort_by_column(mut self, column: &str, descending: bool) -> Result<Self> {
        let index = self
            .column_index(column)
            .ok_or_else(|| Error::query(format!("cannot sort by missing column '{column}'")))?;
        self.rows.sort_by(|a, b| {
            let ord = compare_values(a.get(index), b.get(index));
            if descending { ord.reverse() } else { ord }
        });
        Ok(self)
    }

    /// Drops repeated rows, keeping the first occurrence.
    ///
    /// Rows compare by their JSON text.
    pub fn dedupe(mut self) -> Self {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows.retain(|row| seen.insert(row_key(row)));
        self
    }

    /// Keeps at most `limit` rows.
    pub fn truncate(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(self.render_table()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Csv => self.render_csv(),
            OutputFormat::Markdown => Ok(self.render_markdown()),
        }
    }

    fn render_table(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let widths = self.column_widths(&cells);

        let mut out = String::new();
        push_aligned_line(&mut out, &self.header, &widths);
        let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_aligned_line(&mut out, &underline, &widths);
        for row in &cells {
            push_aligned_line(&mut out, row, &widths);
        }
        out
    }

    fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&markdown_line(self.header.iter().map(String::as_str)));
        out.push_str(&markdown_line(self.header.iter().map(|_| "---")));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            out.push_str(&markdown_line(cells.iter().map(String::as_str)));
        }
        out
    }

    fn render_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| Error::Io(std::io::Error::other(e));
        writer.write_record(&self.header).map_err(csv_err)?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(cell_text))
                .map_err(csv_err)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
    }

    fn column_widths(&self, cells: &[Vec<String>]) -> Vec<usize> {
        let columns = cells
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);
        (0..columns)
            .map(|i| {
                let header = self.header.get(i).map_or(0, |h| h.chars().count());
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .fold(header, usize::max)
            })
            .collect()
    }
}

fn push_aligned_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{cell:<width$}")
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn markdown_line<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// Display text for a single cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        }
        (Some(x), Some(y)) => cell_text(x).cmp(&cell_text(y)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// OutputFormat
// ============================================================================

/// How rendered output is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text columns.
    #[default]
    Table,
    /// Pretty-printed JSON object with `header` and `rows`.
    Json,
    /// Comma-separated values.
    Csv,
    /// Markdown pipe table.
    Markdown,
}

impl OutputFormat {
    /// Every supported format name.
    pub const NAMES: [&'static str; 4] = ["table", "json", "csv", "markdown"];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
        };
        write!(f, "{name}")
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(Error::config(format!(
                "unknown output format '{other}' (expected one of: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
