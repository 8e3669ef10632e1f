// Length-prefixed stream framing for Tableau bootstrap responses.
//
// A response is a concatenation of `<decimal-length>;<payload>` units with no separators. Lengths
// count characters (Unicode scalar values), not bytes. A final unit without a length prefix is kept
// verbatim as a trailing chunk.
use serde_json::Value;

use crate::core::error::{Error, ErrorKind, Result};
use crate::json::parse;

pub const LENGTH_DELIMITER: char = ';';

#[derive(Clone, Debug, PartialEq)]
pub enum Chunk {
    /// A length-prefixed unit decoded as JSON.
    Json(Value),
    /// Unprefixed remainder at the end of the stream, never JSON-decoded.
    Trailing(String),
}

impl Chunk {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Chunk::Json(value) => Some(value),
            Chunk::Trailing(_) => None,
        }
    }

    pub fn as_trailing(&self) -> Option<&str> {
        match self {
            Chunk::Json(_) => None,
            Chunk::Trailing(text) => Some(text),
        }
    }
}

/// Split a complete response body into its chunks, in stream order.
pub fn frame(raw: &str) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut remainder = raw;
    let mut offset = 0u64;

    while !remainder.is_empty() {
        let Some((size_text, rest)) = remainder.split_once(LENGTH_DELIMITER) else {
            chunks.push(Chunk::Trailing(remainder.to_string()));
            break;
        };
        let size = parse_length(size_text).map_err(|err| err.with_offset(offset))?;
        let payload_offset = offset + size_text.chars().count() as u64 + 1;

        let Some((payload, next)) = split_chars(rest, size) else {
            return Err(Error::new(ErrorKind::MalformedStream)
                .with_message(format!(
                    "declared length {size} exceeds the {} characters remaining",
                    rest.chars().count()
                ))
                .with_offset(payload_offset));
        };

        let value = parse::from_str::<Value>(payload).map_err(|err| {
            let context = format!("chunk {}", chunks.len());
            Error::new(ErrorKind::MalformedStream)
                .with_message("chunk payload is not valid JSON")
                .with_hint(parse::hint_for_error(&err, &context))
                .with_offset(payload_offset)
                .with_source(err)
        })?;
        chunks.push(Chunk::Json(value));

        offset = payload_offset + size as u64;
        remainder = next;
    }

    Ok(chunks)
}

fn parse_length(text: &str) -> Result<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::new(ErrorKind::MalformedStream)
            .with_message("length prefix is not a decimal integer")
            .with_hint("Expected `<length>;<json>` units; the response may not be a bootstrap payload."));
    }
    text.parse::<usize>().map_err(|err| {
        Error::new(ErrorKind::MalformedStream)
            .with_message("length prefix is out of range")
            .with_source(err)
    })
}

// Splits after `count` characters; None when fewer than `count` remain.
fn split_chars(text: &str, count: usize) -> Option<(&str, &str)> {
    match text.char_indices().nth(count) {
        Some((index, _)) => Some(text.split_at(index)),
        None if text.chars().count() == count => Some((text, "")),
        None => None,
    }
}
