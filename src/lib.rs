//! National Sites CLI Library
//!
//! This module exposes the response cache, the retrieval functions and the
//! interactive shell for use by the binary and by integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod fetch;
pub mod shell;
