//! Generic CRUD and raw SQL access to a single SQLite file.
//!
//! Three front ends share one operation layer:
//! - [`adapters::http`]: REST API
//! - [`adapters::mcp`]: MCP tool server over stdio
//! - [`adapters::workflow`]: workflow node processing a batch of items
//!
//! Each translates its input into a [`core::Operation`], runs it through
//! [`core::Database`], and shapes the [`core::OperationResult`] with
//! [`core::payload`].

pub mod adapters;
pub mod cli;
pub mod core;
pub mod error;
pub mod logging;

pub use error::{AppError, AppResult};
