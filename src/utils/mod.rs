//! Utility modules for common functionality
//!
//! Provides reusable helpers for process execution.

pub mod process;

pub use process::ProcessRunner;
