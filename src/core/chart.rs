// Chart decoding: pivot Tableau's column-oriented pane storage into rows.
use serde_json::{Map, Value};

use crate::core::dictionary::ValueDictionary;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::schema::{self, PANE_COLUMNS_DATA, VIZ_DATA_COLUMNS, VIZ_PANE_COLUMNS};

/// One decoded chart row: column name -> value.
pub type Row = Map<String, Value>;

/// Reference fields in priority order. The last one is mandatory when the others are absent, null, or empty.
pub const REFERENCE_FIELDS: [&str; 3] = ["valueIndices", "aliasIndices", "tupleIds"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    /// References index into the dictionary values for this tag.
    Typed(String),
    /// References are the values themselves (usually synthetic tuple ids).
    Literal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ColumnKind,
    pub references: Vec<i64>,
}

impl ColumnDefinition {
    fn from_parts(
        definition: &Value,
        path: &str,
        storage: &Value,
        storage_path: &str,
    ) -> Result<Self> {
        let definition = schema::expect_object(definition, path)?;
        let name = ["fieldCaption", "fn"]
            .iter()
            .filter_map(|key| definition.get(*key).and_then(Value::as_str))
            .find(|name| !name.is_empty())
            .ok_or_else(|| schema::mismatch(path, "column has neither fieldCaption nor fn"))?;
        let kind = match definition.get("dataType") {
            None | Some(Value::Null) => ColumnKind::Literal,
            Some(Value::String(tag)) if tag.is_empty() => ColumnKind::Literal,
            Some(Value::String(tag)) => ColumnKind::Typed(tag.clone()),
            Some(other) => {
                return Err(schema::mismatch(
                    format!("{path}.dataType"),
                    format!("expected a string, found {}", schema::type_name(other)),
                ));
            }
        };
        Ok(Self {
            name: name.to_string(),
            kind,
            references: references_at(storage, storage_path)?,
        })
    }

    fn value_at(&self, row: usize, dictionary: &ValueDictionary) -> Result<Value> {
        let reference = self.references[row];
        match &self.kind {
            ColumnKind::Literal => Ok(Value::from(reference)),
            ColumnKind::Typed(tag) => dictionary
                .lookup(tag, reference)
                .cloned()
                .map_err(|err| err.with_path(format!("column `{}` row {row}", self.name))),
        }
    }
}

/// Pick the reference list for one column's pane storage.
pub fn resolve_references(storage: &Value) -> Result<Vec<i64>> {
    references_at(storage, "$")
}

fn references_at(storage: &Value, path: &str) -> Result<Vec<i64>> {
    let storage = schema::expect_object(storage, path)?;
    let (preferred, fallback) = REFERENCE_FIELDS.split_at(REFERENCE_FIELDS.len() - 1);

    for field in preferred {
        let value = match storage.get(*field) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        let references = integer_list(value, &format!("{path}.{field}"))?;
        if !references.is_empty() {
            return Ok(references);
        }
    }
    let field = fallback[0];
    match storage.get(field) {
        Some(value) => integer_list(value, &format!("{path}.{field}")),
        None => Err(schema::mismatch(
            format!("{path}.{field}"),
            format!("column storage has none of {}", REFERENCE_FIELDS.join(", ")),
        )),
    }
}

fn integer_list(value: &Value, path: &str) -> Result<Vec<i64>> {
    schema::expect_array(value, path)?
        .iter()
        .map(|item| {
            item.as_i64()
                .ok_or_else(|| schema::mismatch(path, format!("expected integers, found {item}")))
        })
        .collect()
}

/// Build the column definitions of a chart, pairing each definition with its storage entry.
pub fn columns(chart: &Value) -> Result<Vec<ColumnDefinition>> {
    let pane = PANE_COLUMNS_DATA.resolve(chart)?;
    let definitions = VIZ_DATA_COLUMNS.resolve_array(pane)?;
    let storage = VIZ_PANE_COLUMNS.resolve_array(pane)?;

    definitions
        .iter()
        .enumerate()
        .map(|(index, definition)| {
            let storage_path = format!("{VIZ_PANE_COLUMNS}.{index}");
            let entry = storage.get(index).ok_or_else(|| {
                schema::mismatch(
                    storage_path.as_str(),
                    format!(
                        "{} column definitions but {} storage entries",
                        definitions.len(),
                        storage.len()
                    ),
                )
            })?;
            ColumnDefinition::from_parts(
                definition,
                &format!("{VIZ_DATA_COLUMNS}.{index}"),
                entry,
                &storage_path,
            )
        })
        .collect()
}

/// Decode every row of a chart in storage order.
pub fn decode_chart(chart: &Value, dictionary: &ValueDictionary) -> Result<Vec<Row>> {
    let columns = columns(chart)?;
    let Some(first) = columns.first() else {
        return Err(schema::mismatch(VIZ_DATA_COLUMNS.to_string(), "chart has no columns"));
    };
    let row_count = first.references.len();
    if let Some(column) = columns.iter().find(|column| column.references.len() != row_count) {
        return Err(schema::mismatch(
            VIZ_PANE_COLUMNS.to_string(),
            format!(
                "column `{}` has {} references, expected {row_count}",
                column.name,
                column.references.len()
            ),
        ));
    }

    (0..row_count)
        .map(|row| {
            columns
                .iter()
                .map(|column| Ok((column.name.clone(), column.value_at(row, dictionary)?)))
                .collect::<Result<Row>>()
        })
        .collect()
}

/// Decode a one-row summary chart and return one of its fields.
pub fn decode_scalar(chart: &Value, dictionary: &ValueDictionary, field: &str) -> Result<Value> {
    let mut rows = decode_chart(chart, dictionary)?;
    if rows.is_empty() {
        return Err(Error::new(ErrorKind::RowNotFound).with_message("summary chart has no rows"));
    }
    let mut first = rows.swap_remove(0);
    first.remove(field).ok_or_else(|| {
        let available = first.keys().cloned().collect::<Vec<_>>().join(", ");
        Error::new(ErrorKind::FieldNotFound)
            .with_message(format!("field `{field}` not found"))
            .with_hint(format!("Available fields: {available}"))
    })
}
