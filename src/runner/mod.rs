//! Sequential execution of the tool battery
//!
//! Tools run one after another against a staged [`Sample`]. A tool that is
//! missing, fails, or times out never aborts the battery: its error text
//! becomes its output.

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{AnalysisConfig, StegprocConfig};
use crate::sample::Sample;
use crate::tools::{Capture, ToolContext, ToolSpec};

/// How a single tool run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ok,
    Failed,
    Missing,
    TimedOut,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolStatus::Ok => "ok",
            ToolStatus::Failed => "failed",
            ToolStatus::Missing => "missing",
            ToolStatus::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub status: ToolStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

/// Everything one battery run produced, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file: String,
    pub size: u64,
    pub results: Vec<ToolResult>,
}

impl AnalysisReport {
    /// `{tool: output}`
    pub fn to_flat_json(&self) -> Value {
        let map: Map<String, Value> = self
            .results
            .iter()
            .map(|r| (r.tool.clone(), Value::String(r.outcome.output.clone())))
            .collect();
        Value::Object(map)
    }

    /// `{file, size, results: {tool: {status, exit_code, duration_ms, output}}}`
    pub fn to_detailed_json(&self) -> Value {
        let results: Map<String, Value> = self
            .results
            .iter()
            .map(|r| (r.tool.clone(), json!(r.outcome)))
            .collect();

        json!({
            "file": self.file,
            "size": self.size,
            "results": results,
        })
    }

    pub fn get(&self, tool: &str) -> Option<&ToolOutcome> {
        self.results
            .iter()
            .find(|r| r.tool == tool)
            .map(|r| &r.outcome)
    }
}

/// Runs the configured battery
#[derive(Debug, Clone)]
pub struct Runner {
    tools: Vec<ToolSpec>,
    analysis: AnalysisConfig,
}

impl Runner {
    pub fn new(config: &StegprocConfig) -> Self {
        Self {
            tools: config.tools.clone(),
            analysis: config.analysis.clone(),
        }
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn default_password(&self) -> &str {
        &self.analysis.default_password
    }

    /// Pick the tools for one run: every enabled tool, or exactly the named
    /// ones (disabled included), always in battery order
    pub fn select(&self, only: Option<&[String]>) -> Result<Vec<&ToolSpec>> {
        let Some(names) = only.filter(|names| !names.is_empty()) else {
            return Ok(self.tools.iter().filter(|t| t.enabled).collect());
        };

        for name in names {
            if !self.tools.iter().any(|t| &t.name == name) {
                bail!("Unknown tool: {name}");
            }
        }

        Ok(self
            .tools
            .iter()
            .filter(|t| names.iter().any(|n| n == &t.name))
            .collect())
    }

    pub fn context(&self, sample: &Sample, password: &str) -> ToolContext {
        ToolContext {
            file: sample.path().to_path_buf(),
            workdir: sample.workdir().to_path_buf(),
            password: password.to_string(),
            wordlist: self.analysis.wordlist.clone(),
            stegsolve_jar: self.analysis.stegsolve_jar.clone(),
        }
    }

    /// Run the selected tools strictly one after another
    pub async fn run_battery(
        &self,
        sample: &Sample,
        password: &str,
        only: Option<&[String]>,
    ) -> Result<AnalysisReport> {
        let selected = self.select(only)?;
        let ctx = self.context(sample, password);

        info!(
            "Analyzing {} ({} bytes) with {} tools",
            sample.name(),
            sample.size(),
            selected.len()
        );

        let mut results = Vec::with_capacity(selected.len());
        for tool in selected {
            let outcome = self.run_tool(tool, &ctx).await;
            results.push(ToolResult {
                tool: tool.name.clone(),
                outcome,
            });
        }

        Ok(AnalysisReport {
            file: sample.name().to_string(),
            size: sample.size(),
            results,
        })
    }

    pub async fn run_tool(&self, tool: &ToolSpec, ctx: &ToolContext) -> ToolOutcome {
        let start = Instant::now();

        let program = match which::which(&tool.program) {
            Ok(path) => path,
            Err(_) => {
                warn!("{}: {} is not installed", tool.name, tool.program);
                return ToolOutcome {
                    status: ToolStatus::Missing,
                    exit_code: None,
                    duration_ms: 0,
                    output: format!("{}: command not found", tool.program),
                };
            }
        };

        let args = tool.render_args(ctx);
        debug!("Running {} {:?}", program.display(), args);

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .current_dir(&ctx.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let limit = Duration::from_secs(tool.timeout_secs.unwrap_or(self.analysis.timeout_secs));
        let result = timeout(limit, cmd.output()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(Ok(output)) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                if tool.capture != Capture::Stdout {
                    let capture = tool.capture.clone();
                    let workdir = ctx.workdir.clone();
                    match tokio::task::spawn_blocking(move || collect_capture(&capture, &workdir))
                        .await
                    {
                        Ok(collected) => text.push_str(&collected),
                        Err(e) => warn!("{}: output collection failed: {}", tool.name, e),
                    }
                }

                ToolOutcome {
                    status: if output.status.success() {
                        ToolStatus::Ok
                    } else {
                        ToolStatus::Failed
                    },
                    exit_code: output.status.code(),
                    duration_ms,
                    output: truncate_output(text, self.analysis.max_output_bytes),
                }
            }
            Ok(Err(e)) => ToolOutcome {
                status: ToolStatus::Failed,
                exit_code: None,
                duration_ms,
                output: format!("Failed to run {}: {}", tool.program, e),
            },
            Err(_) => {
                warn!("{} timed out after {}s", tool.name, limit.as_secs());
                ToolOutcome {
                    status: ToolStatus::TimedOut,
                    exit_code: None,
                    duration_ms,
                    output: format!("{} timed out after {}s", tool.name, limit.as_secs()),
                }
            }
        };

        info!(
            tool = %tool.name,
            status = %outcome.status,
            exit_code = ?outcome.exit_code,
            duration_ms = outcome.duration_ms,
            "tool finished"
        );

        outcome
    }
}

/// Post-run collection for tools that write results to disk
fn collect_capture(capture: &Capture, workdir: &Path) -> String {
    match capture {
        Capture::Stdout => String::new(),
        Capture::ListDir { dir } => {
            let root = workdir.join(dir);
            if !root.is_dir() {
                return String::new();
            }

            let mut entries: Vec<String> = WalkDir::new(&root)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    entry
                        .path()
                        .strip_prefix(workdir)
                        .ok()
                        .map(|p| p.to_string_lossy().into_owned())
                })
                .collect();

            if entries.is_empty() {
                return String::new();
            }
            entries.insert(0, dir.clone());

            let mut listing = entries.join("\n");
            listing.push('\n');
            listing
        }
        Capture::ReadFile { file } => match std::fs::read(workdir.join(file)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        },
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, noting how much was dropped
pub fn truncate_output(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }

    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    let dropped = text.len() - cut;
    text.truncate(cut);
    text.push_str(&format!("\n[truncated {dropped} bytes]"));
    text
}
