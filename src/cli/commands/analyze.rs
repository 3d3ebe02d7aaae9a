//! Run the battery against a local file

use anyhow::{Context, Result};
use std::path::Path;

use super::load_config;
use crate::cli::{Output, ReportFormat};
use crate::runner::{AnalysisReport, Runner, ToolStatus};
use crate::sample::Sample;

pub struct AnalyzeArgs {
    pub file: String,
    pub password: Option<String>,
    pub only: Vec<String>,
    pub format: ReportFormat,
    pub detailed: bool,
}

pub async fn execute(config_path: Option<&str>, args: AnalyzeArgs, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let runner = Runner::new(&config);

    let path = Path::new(&args.file);
    let sample = Sample::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let password = args
        .password
        .unwrap_or_else(|| runner.default_password().to_string());
    let only = (!args.only.is_empty()).then_some(args.only.as_slice());

    output.verbose(&format!("Staged {} in {}", sample.name(), sample.workdir().display()));
    let report = runner.run_battery(&sample, &password, only).await?;

    match args.format {
        ReportFormat::Json => {
            let value = if args.detailed {
                report.to_detailed_json()
            } else {
                report.to_flat_json()
            };
            output.raw(&serde_json::to_string_pretty(&value)?);
        }
        ReportFormat::Text => print_text(&report, output),
    }

    Ok(())
}

fn print_text(report: &AnalysisReport, output: &Output) {
    output.header(&format!("🔎 {} ({} bytes)", report.file, report.size));

    for result in &report.results {
        let outcome = &result.outcome;
        output.section_header(&format!(
            "{} [{}] {}ms",
            result.tool, outcome.status, outcome.duration_ms
        ));
        let body = outcome.output.trim_end();
        if !body.is_empty() {
            output.raw(body);
        }
    }

    let missing = report
        .results
        .iter()
        .filter(|r| r.outcome.status == ToolStatus::Missing)
        .count();
    let total = report.results.len();

    if missing > 0 {
        output.warning(&format!("{missing} of {total} tools are not installed"));
    } else {
        output.success(&format!("Ran {total} tools"));
    }
}
