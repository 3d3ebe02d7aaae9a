use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::Path;

use super::StegprocConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "STEGPROC_";

impl StegprocConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let figment = Self::figment(custom_config)?;
        figment
            .extract()
            .context("Failed to parse configuration")
    }

    /// Build the layered figment: defaults, then files, then environment
    pub fn figment(custom_config: Option<&str>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            let path = Path::new(custom_path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {custom_path}");
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        } else {
            let user = Self::user_config_base();
            figment = figment
                // User config - support multiple formats
                .merge(Toml::file(format!("{user}.toml")))
                .merge(Json::file(format!("{user}.json")))
                .merge(Yaml::file(format!("{user}.yaml")))
                .merge(Yaml::file(format!("{user}.yml")))
                // Working directory config
                .merge(Toml::file("stegproc.toml"))
                .merge(Json::file("stegproc.json"))
                .merge(Yaml::file("stegproc.yaml"))
                .merge(Yaml::file("stegproc.yml"));
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn user_config_base() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/stegproc/config"),
            Err(_) => "~/.config/stegproc/config".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_loads_defaults() {
        let config = StegprocConfig::load().expect("Should load default config");

        assert_eq!(config.analysis.timeout_secs, 60);
        assert_eq!(config.analysis.max_output_bytes, 1024 * 1024);
        assert!(config.tools.iter().any(|t| t.name == "binwalk"));
        assert!(config.tools.iter().any(|t| t.name == "stegseek"));
    }

    #[test]
    fn test_custom_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[server]
port = 8081

[[tools]]
name = "cat"
program = "cat"
args = ["{file}"]
"#,
        )
        .unwrap();

        let config = StegprocConfig::load_with_custom_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 8081);
        // Untouched keys keep their embedded defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tools.len(), 1);
        assert_eq!(config.tools[0].name, "cat");
        assert!(config.tools[0].enabled);
    }

    #[test]
    fn test_custom_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "analysis:\n  timeout_secs: 5\n").unwrap();

        let config = StegprocConfig::load_with_custom_config(path.to_str()).unwrap();
        assert_eq!(config.analysis.timeout_secs, 5);
    }

    #[test]
    fn test_missing_custom_config_is_an_error() {
        let config = StegprocConfig::load_with_custom_config(Some("non_existent.toml"));
        assert!(config.is_err());
    }
}
