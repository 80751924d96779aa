//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: drive a headless scheduler with demo callbacks
//! - config: print the resolved configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tickr - per-frame callback scheduler
#[derive(Parser, Debug)]
#[command(name = "tickr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a headless scheduler and report queue activity
    Run {
        /// Number of frames to run (overrides runtime.max-frames)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Target frames per second (overrides runtime.target-fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Pixels scrolled per frame
        #[arg(short, long, default_value_t = 4.0)]
        scroll_step: f64,

        /// Resize the viewport every N frames (0 = never)
        #[arg(short, long, default_value_t = 60)]
        resize_every: u64,

        /// Start paused
        #[arg(short, long)]
        paused: bool,
    },

    /// Print the resolved configuration
    Config,
}
