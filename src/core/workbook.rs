// A decoded bootstrap response: layout document, data document, and the shared dictionary.
use serde_json::{Map, Value};

use crate::core::chart::{self, Row};
use crate::core::dictionary::ValueDictionary;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::frame::{self, Chunk};
use crate::core::schema::{self, CHART_MAP};

#[derive(Clone, Debug)]
pub struct Workbook {
    layout: Value,
    data: Value,
    dictionary: ValueDictionary,
}

impl Workbook {
    /// Frame and decode a complete bootstrap response body.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_chunks(frame::frame(raw)?)
    }

    /// Build from framed chunks; chunk 0 is layout, chunk 1 holds the dictionary and charts.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
        let count = chunks.len();
        let mut documents = chunks.into_iter();
        let layout = json_document(documents.next(), 0, count)?;
        let data = json_document(documents.next(), 1, count)?;
        let dictionary = ValueDictionary::extract(&data)?;
        tracing::debug!(
            tags = dictionary.tags().count(),
            "decoded value dictionary"
        );
        Ok(Self {
            layout,
            data,
            dictionary,
        })
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.layout.get("sheetName").and_then(Value::as_str)
    }

    pub fn dictionary(&self) -> &ValueDictionary {
        &self.dictionary
    }

    pub fn chart_names(&self) -> Result<Vec<&str>> {
        Ok(self.charts()?.keys().map(String::as_str).collect())
    }

    pub fn chart(&self, name: &str) -> Result<&Value> {
        self.charts()?.get(name).ok_or_else(|| {
            schema::mismatch(format!("{CHART_MAP}.{name}"), format!("chart `{name}` not found"))
                .with_hint("The dashboard layout may have changed; list charts with `vaxreport decode`.")
        })
    }

    pub fn rows(&self, name: &str) -> Result<Vec<Row>> {
        let chart = self.chart(name)?;
        chart::decode_chart(chart, &self.dictionary).map_err(|err| in_chart(err, name))
    }

    pub fn scalar(&self, name: &str, field: &str) -> Result<Value> {
        let chart = self.chart(name)?;
        chart::decode_scalar(chart, &self.dictionary, field).map_err(|err| in_chart(err, name))
    }

    fn charts(&self) -> Result<&Map<String, Value>> {
        CHART_MAP.resolve_object(&self.data)
    }
}

fn json_document(chunk: Option<Chunk>, index: usize, count: usize) -> Result<Value> {
    match chunk {
        Some(Chunk::Json(value)) => Ok(value),
        Some(Chunk::Trailing(_)) => Err(Error::new(ErrorKind::SchemaMismatch)
            .with_message(format!("document {index} has no length prefix"))),
        None => Err(Error::new(ErrorKind::SchemaMismatch).with_message(format!(
            "expected at least 2 documents, found {count}"
        ))),
    }
}

fn in_chart(err: Error, name: &str) -> Error {
    let location = match err.path() {
        Some(path) => format!("{name}: {path}"),
        None => name.to_string(),
    };
    err.with_path(location)
}
