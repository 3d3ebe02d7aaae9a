//! Tool battery definitions
//!
//! A tool is an external program plus an argument template. Templates may
//! reference `{file}`, `{workdir}`, `{password}`, `{wordlist}` and
//! `{stegsolve_jar}`; they are expanded per request and handed to the
//! program as argv, never through a shell.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;

#[cfg(test)]
mod tests;

/// One external program in the battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Key under which the tool's output is reported
    pub name: String,

    /// Executable, looked up on PATH
    pub program: String,

    /// Argument template
    #[serde(default)]
    pub args: Vec<String>,

    /// Disabled tools only run when a request names them
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// What to collect once the program exits
    #[serde(default)]
    pub capture: Capture,

    /// Overrides `analysis.timeout_secs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub description: String,
}

/// Output collection strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capture {
    /// stdout followed by stderr
    #[default]
    Stdout,
    /// Also list every entry written under `workdir/<dir>`
    ListDir { dir: String },
    /// Also append the contents of `workdir/<file>`
    ReadFile { file: String },
}

fn default_enabled() -> bool {
    true
}

/// Values substituted into argument templates
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub file: PathBuf,
    pub workdir: PathBuf,
    pub password: String,
    pub wordlist: String,
    pub stegsolve_jar: String,
}

/// Availability summary shown by `stegproc tools` and `GET /tools`
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub program: String,
    pub description: String,
    pub enabled: bool,
    pub available: bool,
}

impl ToolSpec {
    pub fn new(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            enabled: true,
            capture: Capture::Stdout,
            timeout_secs: None,
            description: String::new(),
        }
    }

    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Expand the argument template for one run
    pub fn render_args(&self, ctx: &ToolContext) -> Vec<String> {
        self.args.iter().map(|arg| expand(arg, ctx)).collect()
    }

    /// Check whether the program resolves on PATH
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            program: self.program.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            available: self.is_available(),
        }
    }
}

impl ToolContext {
    fn lookup(&self, placeholder: &str) -> Option<Cow<'_, str>> {
        match placeholder {
            "file" => Some(self.file.to_string_lossy()),
            "workdir" => Some(self.workdir.to_string_lossy()),
            "password" => Some(Cow::Borrowed(self.password.as_str())),
            "wordlist" => Some(Cow::Borrowed(self.wordlist.as_str())),
            "stegsolve_jar" => Some(Cow::Borrowed(self.stegsolve_jar.as_str())),
            _ => None,
        }
    }
}

/// Single left-to-right pass; substituted values are never rescanned
fn expand(template: &str, ctx: &ToolContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let token = tail
            .find('}')
            .and_then(|end| ctx.lookup(&tail[1..end]).map(|value| (end, value)));

        match token {
            Some((end, value)) => {
                out.push_str(&value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// The built-in battery, in execution order
pub fn default_battery() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("cat", "cat", &["{file}"]).with_description("Raw file contents"),
        ToolSpec::new("strings", "strings", &["{file}"])
            .with_description("Printable character sequences"),
        ToolSpec::new("binwalk", "binwalk", &["{file}"])
            .with_description("Embedded file signatures"),
        ToolSpec::new(
            "foremost",
            "foremost",
            &["-i", "{file}", "-o", "{workdir}/foremost_out"],
        )
        .with_capture(Capture::ListDir {
            dir: "foremost_out".to_string(),
        })
        .with_description("File carving"),
        ToolSpec::new("zsteg", "zsteg", &["{file}"])
            .with_description("PNG/BMP LSB payload detection"),
        ToolSpec::new("steghide", "steghide", &["info", "{file}", "-p", "{password}"])
            .with_description("Steghide embedding info"),
        ToolSpec::new(
            "stegseek",
            "stegseek",
            &["--crack", "{file}", "{wordlist}", "{workdir}/stegseek_out"],
        )
        .with_capture(Capture::ReadFile {
            file: "stegseek_out".to_string(),
        })
        .with_description("Steghide passphrase recovery"),
        ToolSpec::new("outguess", "outguess", &["-r", "{file}", "{workdir}/outguess_out"])
            .with_capture(Capture::ReadFile {
                file: "outguess_out".to_string(),
            })
            .with_description("Outguess extraction"),
        ToolSpec::new("exiftool", "exiftool", &["{file}"]).with_description("Metadata"),
        ToolSpec::new("pngcheck", "pngcheck", &["-v", "{file}"])
            .with_description("PNG chunk integrity"),
        ToolSpec::new("stegsolve", "java", &["-jar", "{stegsolve_jar}", "{file}"])
            .with_description("Stegsolve (GUI, run on request only)")
            .disabled(),
    ]
}
