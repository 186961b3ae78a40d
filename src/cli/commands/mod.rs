//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod properties;
pub mod run;
pub mod validate;
