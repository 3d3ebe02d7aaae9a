//! Command implementations for the Stegproc CLI
//!
//! Each command is organized into its own module.

pub mod analyze;
pub mod config;
pub mod serve;
pub mod tools;
pub mod version;

use anyhow::{Context, Result};

use crate::config::StegprocConfig;

/// Load and validate configuration for a command
fn load_config(config_path: Option<&str>) -> Result<StegprocConfig> {
    let config = StegprocConfig::load_with_custom_config(config_path)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
