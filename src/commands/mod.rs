//! CLI command implementations.
//!
//! Each command has a `run` entry point that prints to stdout, and a
//! filesystem-generic core that the tests drive directly.

pub mod adb;
pub mod aggregate;
pub mod clean;
pub mod o365;
pub mod prune;

/// Whether a command rewrote its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Nothing to change, the file was left untouched
    Unchanged,
}
