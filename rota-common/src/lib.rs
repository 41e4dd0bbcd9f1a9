//! # Rota Common Library
//!
//! Shared code for the rota schedule tools including:
//! - Fatal error types (`Error`, `Result`)
//! - Bootstrap configuration loading and root folder resolution
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
