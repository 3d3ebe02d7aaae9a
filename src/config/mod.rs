//! Configuration management for Stegproc
//!
//! Typed configuration for the HTTP server, the analysis runner, the local
//! sample store and the tool battery. Loading and layering lives in `core`.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::tools::{ToolSpec, default_battery};

mod core;

/// Main configuration structure for Stegproc
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StegprocConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Tool execution settings
    pub analysis: AnalysisConfig,

    /// Local sample store
    pub storage: StorageConfig,

    /// Ordered tool battery
    pub tools: Vec<ToolSpec>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

/// Settings shared by every tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Per-tool timeout (seconds), unless the tool overrides it
    pub timeout_secs: u64,

    /// Captured output is cut at this many bytes
    pub max_output_bytes: usize,

    /// Wordlist handed to stegseek
    pub wordlist: String,

    /// Location of stegsolve.jar
    pub stegsolve_jar: String,

    /// Passphrase used when a request does not carry one
    pub default_password: String,
}

/// Directory that referenced keys are resolved against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl Default for StegprocConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            analysis: AnalysisConfig::default(),
            storage: StorageConfig::default(),
            tools: default_battery(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_output_bytes: 1024 * 1024,
            wordlist: "/usr/share/wordlists/rockyou.txt".to_string(),
            stegsolve_jar: "/opt/stegsolve/stegsolve.jar".to_string(),
            default_password: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
        }
    }
}

impl StegprocConfig {
    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }

        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be non-zero");
        }

        if self.analysis.timeout_secs == 0 {
            bail!("analysis.timeout_secs must be non-zero");
        }

        if self.tools.is_empty() {
            bail!("Tool battery is empty");
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name.is_empty()
                || !tool
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                bail!("Invalid tool name: '{}'", tool.name);
            }

            if !seen.insert(tool.name.as_str()) {
                bail!("Duplicate tool name: '{}'", tool.name);
            }

            if tool.program.trim().is_empty() {
                bail!("Tool '{}' has no program", tool.name);
            }

            if !tool.args.iter().any(|arg| arg.contains("{file}")) {
                bail!("Tool '{}' never references {{file}} in its arguments", tool.name);
            }

            if tool.timeout_secs == Some(0) {
                bail!("Tool '{}' has a zero timeout", tool.name);
            }
        }

        Ok(())
    }
}
