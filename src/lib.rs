//! Purpose: Library crate behind the `vaxreport` CLI and its tests.
//! Exports: `core` (Tableau stream framing and chart decoding), `api` (HTTP clients, report
//! assembly), `config`, `stamp`.
//! Role: Decoder core stays pure; network and date glue live in `api` and `stamp`.
//! Invariants: Core functions are pure over in-memory input and keep no state between calls.
//! Invariants: Errors propagate to the caller; nothing is defaulted or partially reported.
pub mod api;
pub mod config;
pub mod core;
mod json;
pub mod stamp;
