//! Purpose: Internal JSON parsing boundary shared by the framer and the HTTP clients.
//! Exports: `parse` module with decode helpers and failure classification.
//! Role: Single seam for parser details so callsites avoid ad hoc decode logic.
//! Invariants: Runtime JSON decoding of untrusted payloads goes through this module.

pub(crate) mod parse;
