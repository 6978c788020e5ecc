//! Sheet sync: a pure row-diff plan plus the client that applies it.
//!
//! The pipeline only supplies the target roster; everything that actually
//! touches the spreadsheet lives here.

pub mod client;
pub mod plan;

pub use client::SheetsClient;
pub use plan::{clean_plan, CleanPlan, DEFAULT_HANDLE_COLUMN, DEFAULT_HEADER_ROWS};
