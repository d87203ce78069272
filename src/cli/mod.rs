//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod convert;
mod info;
mod validate;

pub use convert::run_convert;
pub use info::run_info;
pub use validate::run_validate;
