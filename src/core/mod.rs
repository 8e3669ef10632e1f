// Decoder core: framing, schema paths, dictionary, chart decoding, and errors.
pub mod chart;
pub mod dictionary;
pub mod error;
pub mod frame;
pub mod schema;
pub mod workbook;
