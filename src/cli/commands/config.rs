//! Configuration management commands

use anyhow::{Context, Result};

use crate::cli::{ConfigCommands, ConfigFormat, Output};
use crate::config::StegprocConfig;

/// Execute configuration commands
pub fn execute(cmd: ConfigCommands, config_path: Option<&str>, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(config_path, output),
        ConfigCommands::Show { format } => show(config_path, format, output),
    }
}

fn validate(config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = StegprocConfig::load_with_custom_config(config_path)?;

    if let Err(e) = config.validate() {
        output.error(&format!("Configuration is invalid: {e}"));
        return Err(e);
    }

    output.success(&format!(
        "Configuration is valid ({} tools, {} enabled)",
        config.tools.len(),
        config.tools.iter().filter(|t| t.enabled).count()
    ));
    Ok(())
}

fn show(config_path: Option<&str>, format: ConfigFormat, output: &Output) -> Result<()> {
    let config = StegprocConfig::load_with_custom_config(config_path)?;

    let rendered = match format {
        ConfigFormat::Toml => {
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?
        }
        ConfigFormat::Json => {
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?
        }
        ConfigFormat::Yaml => {
            serde_yml::to_string(&config).context("Failed to serialize configuration")?
        }
    };

    output.raw(rendered.trim_end());
    Ok(())
}
