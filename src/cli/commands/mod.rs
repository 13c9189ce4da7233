//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod check;
pub mod diff;
pub mod dump;
pub mod init;
pub mod run;
pub mod validate;
