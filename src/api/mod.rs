//! Purpose: Define the public Rust API boundary for the vaccination report.
//! Exports: Clients, report assembly, and the error types needed by the CLI.
//! Role: Network-facing layer over the decoder core.
//! Invariants: HTTP helpers stay private; callers go through the typed clients.

mod http;

pub mod dashboard;
pub mod equity;
pub mod regions;
pub mod report;
pub mod stats;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::workbook::Workbook;
pub use dashboard::DashboardClient;
pub use equity::{EquityClient, Groupings, RegionGroupings};
pub use report::{Report, assemble, generate};
pub use stats::DashboardStats;
