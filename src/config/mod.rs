//! Configuration system for tickr.
//!
//! A single YAML layer (~/.config/tickr/tickr.yml or .tickr.yml) with
//! every field defaulted.

use eyre::Result;
use std::path::PathBuf;

pub use self::global::{QueuesConfig, RuntimeConfig, TickrConfig};

mod global;

/// Short alias used by the binary.
pub type Config = TickrConfig;

/// Default prefix for ready-signal event names.
pub const DEFAULT_NAMESPACE: &str = "tickr";

/// Load configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .tickr.yml in current directory (project config)
/// 3. ~/.config/tickr/tickr.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<TickrConfig> {
    TickrConfig::load(explicit_path)
}
