//! CLI module for tickr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for driving a headless
//! scheduler and inspecting configuration.

pub mod commands;

pub use commands::Cli;
