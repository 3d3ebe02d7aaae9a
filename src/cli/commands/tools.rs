//! List the configured battery

use anyhow::Result;
use console::style;

use super::load_config;
use crate::cli::Output;

pub async fn execute(config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;

    output.header("🧰 Tool Battery");
    for tool in &config.tools {
        let info = tool.info();
        let mark = if info.available {
            style("✔").green()
        } else {
            style("✖").red()
        };
        let state = if info.enabled { "" } else { " (on request)" };

        output.table_row(
            &info.name,
            &format!("{} {}{} {}", mark, info.program, state, style(&info.description).dim()),
        );
    }

    let missing = config
        .tools
        .iter()
        .filter(|t| t.enabled && !t.is_available())
        .count();
    if missing > 0 {
        output.warning(&format!("{missing} enabled tools are not installed"));
    } else {
        output.success("All enabled tools are installed");
    }

    Ok(())
}
