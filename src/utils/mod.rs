//! Shared helpers: command execution, git, logging.

pub mod exec;
pub mod git;
pub mod log;
