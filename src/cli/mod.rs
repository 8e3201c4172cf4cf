//! Command-line interface
//!
//! Argument parsing and command dispatch for the `unveil` binary.

pub mod args;
pub mod commands;
