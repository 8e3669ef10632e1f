// Shared value dictionary: data-type tag -> ordered values, referenced by index from chart columns.
use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::schema::{self, DICTIONARY_COLUMNS};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueDictionary {
    values: BTreeMap<String, Vec<Value>>,
}

impl ValueDictionary {
    /// Fold the dictionary segments out of the bootstrap data document.
    ///
    /// A repeated `dataType` replaces the earlier segment.
    pub fn extract(document: &Value) -> Result<Self> {
        let segments = DICTIONARY_COLUMNS.resolve_array(document)?;
        let mut values = BTreeMap::new();
        for (index, segment) in segments.iter().enumerate() {
            let path = format!("{DICTIONARY_COLUMNS}.{index}");
            let segment = schema::expect_object(segment, &path)?;
            let tag = segment
                .get("dataType")
                .and_then(Value::as_str)
                .ok_or_else(|| schema::mismatch(format!("{path}.dataType"), "missing string dataType"))?;
            let data = segment
                .get("dataValues")
                .ok_or_else(|| schema::mismatch(format!("{path}.dataValues"), "missing dataValues"))?;
            let data = schema::expect_array(data, &format!("{path}.dataValues"))?;
            values.insert(tag.to_string(), data.to_vec());
        }
        Ok(Self { values })
    }

    pub fn from_values(values: BTreeMap<String, Vec<Value>>) -> Self {
        Self { values }
    }

    pub fn values(&self, tag: &str) -> Option<&[Value]> {
        self.values.get(tag).map(Vec::as_slice)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dereference `index` within the `tag` sequence.
    pub fn lookup(&self, tag: &str, index: i64) -> Result<&Value> {
        let values = self.values(tag).ok_or_else(|| {
            Error::new(ErrorKind::DictionaryIndexOutOfRange)
                .with_message(format!("dictionary has no `{tag}` values"))
        })?;
        usize::try_from(index)
            .ok()
            .and_then(|index| values.get(index))
            .ok_or_else(|| {
                Error::new(ErrorKind::DictionaryIndexOutOfRange).with_message(format!(
                    "index {index} is outside the {} `{tag}` values",
                    values.len()
                ))
            })
    }
}
