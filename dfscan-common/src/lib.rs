//! # dfscan Common Library
//!
//! Shared code for the dfscan workspace:
//! - Error and result types
//! - Configuration file resolution and TOML loading
//! - Tracing subscriber initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
