// Fixed key paths into the Tableau bootstrap document.
//
// Every navigation into the upstream format goes through a `SchemaPath` so a format change surfaces
// as one `SchemaMismatch` naming the first step that failed.
use std::fmt;

use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Key(&'static str),
    Index(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SchemaPath {
    steps: &'static [Step],
}

/// Value segments of the shared dictionary, relative to the data document.
pub const DICTIONARY_COLUMNS: SchemaPath = SchemaPath::new(&[
    Step::Key("secondaryInfo"),
    Step::Key("presModelMap"),
    Step::Key("dataDictionary"),
    Step::Key("presModelHolder"),
    Step::Key("genDataDictionaryPresModel"),
    Step::Key("dataSegments"),
    Step::Key("0"),
    Step::Key("dataColumns"),
]);

/// Named charts, relative to the data document.
pub const CHART_MAP: SchemaPath = SchemaPath::new(&[
    Step::Key("secondaryInfo"),
    Step::Key("presModelMap"),
    Step::Key("vizData"),
    Step::Key("presModelHolder"),
    Step::Key("genPresModelMapPresModel"),
    Step::Key("presModelMap"),
]);

/// Column data of one chart, relative to the chart.
pub const PANE_COLUMNS_DATA: SchemaPath = SchemaPath::new(&[
    Step::Key("presModelHolder"),
    Step::Key("genVizDataPresModel"),
    Step::Key("paneColumnsData"),
]);

/// Column definitions, relative to `PANE_COLUMNS_DATA`.
pub const VIZ_DATA_COLUMNS: SchemaPath = SchemaPath::new(&[Step::Key("vizDataColumns")]);

/// Per-column reference storage, relative to `PANE_COLUMNS_DATA`.
pub const VIZ_PANE_COLUMNS: SchemaPath = SchemaPath::new(&[
    Step::Key("paneColumnsList"),
    Step::Index(0),
    Step::Key("vizPaneColumns"),
]);

impl SchemaPath {
    pub const fn new(steps: &'static [Step]) -> Self {
        Self { steps }
    }

    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        let mut current = root;
        for (depth, step) in self.steps.iter().enumerate() {
            let next = match step {
                Step::Key(key) => current.as_object().map(|object| object.get(*key)),
                Step::Index(index) => current.as_array().map(|items| items.get(*index)),
            };
            current = match next {
                Some(Some(value)) => value,
                Some(None) => {
                    return Err(mismatch(self.prefix(depth + 1), format!("missing {step}"))
                        .with_hint(format!("Expected path `{self}`; the dashboard format may have changed.")));
                }
                None => {
                    let expected = match step {
                        Step::Key(_) => "an object",
                        Step::Index(_) => "an array",
                    };
                    return Err(mismatch(
                        self.prefix(depth),
                        format!("expected {expected}, found {}", type_name(current)),
                    )
                    .with_hint(format!("Expected path `{self}`; the dashboard format may have changed.")));
                }
            };
        }
        Ok(current)
    }

    pub fn resolve_array<'v>(&self, root: &'v Value) -> Result<&'v [Value]> {
        expect_array(self.resolve(root)?, &self.to_string())
    }

    pub fn resolve_object<'v>(&self, root: &'v Value) -> Result<&'v Map<String, Value>> {
        expect_object(self.resolve(root)?, &self.to_string())
    }

    fn prefix(&self, len: usize) -> String {
        join_steps(&self.steps[..len])
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => write!(f, "key `{key}`"),
            Step::Index(index) => write!(f, "index {index}"),
        }
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_steps(self.steps))
    }
}

fn join_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "$".to_string();
    }
    steps
        .iter()
        .map(|step| match step {
            Step::Key(key) => (*key).to_string(),
            Step::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn mismatch(path: impl Into<String>, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::SchemaMismatch)
        .with_message(message)
        .with_path(path)
}

pub(crate) fn expect_array<'v>(value: &'v Value, path: &str) -> Result<&'v [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(path, format!("expected an array, found {}", type_name(value))))
}

pub(crate) fn expect_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch(path, format!("expected an object, found {}", type_name(value))))
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
