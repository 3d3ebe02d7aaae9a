//! Start the HTTP processor

use anyhow::Result;

use super::load_config;
use crate::cli::Output;
use crate::server;

pub async fn execute(
    config_path: Option<&str>,
    host: Option<String>,
    port: Option<u16>,
    output: &Output,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let missing: Vec<&str> = config
        .tools
        .iter()
        .filter(|t| t.enabled && !t.is_available())
        .map(|t| t.name.as_str())
        .collect();
    if !missing.is_empty() {
        output.warning(&format!("Not installed: {}", missing.join(", ")));
    }

    output.info(&format!("Starting processor on http://{}", config.bind_address()));
    server::serve(config).await
}
