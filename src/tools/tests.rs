//! Tool battery tests

use super::*;
use std::path::PathBuf;

fn context() -> ToolContext {
    ToolContext {
        file: PathBuf::from("/tmp/job/input/cat.png"),
        workdir: PathBuf::from("/tmp/job"),
        password: "hunter2".to_string(),
        wordlist: "/usr/share/wordlists/rockyou.txt".to_string(),
        stegsolve_jar: "/opt/stegsolve.jar".to_string(),
    }
}

#[test]
fn test_render_substitutes_file_and_workdir() {
    let tool = ToolSpec::new(
        "foremost",
        "foremost",
        &["-i", "{file}", "-o", "{workdir}/foremost_out"],
    );

    assert_eq!(
        tool.render_args(&context()),
        vec!["-i", "/tmp/job/input/cat.png", "-o", "/tmp/job/foremost_out"]
    );
}

#[test]
fn test_render_substitutes_password_and_wordlist() {
    let steghide = ToolSpec::new("steghide", "steghide", &["info", "{file}", "-p", "{password}"]);
    assert_eq!(steghide.render_args(&context())[3], "hunter2");

    let stegseek = ToolSpec::new("stegseek", "stegseek", &["--crack", "{file}", "{wordlist}"]);
    assert_eq!(
        stegseek.render_args(&context())[2],
        "/usr/share/wordlists/rockyou.txt"
    );
}

#[test]
fn test_password_is_a_single_argument() {
    let mut ctx = context();
    ctx.password = "a b'; rm -rf /".to_string();
    let tool = ToolSpec::new("steghide", "steghide", &["-p", "{password}"]);

    let args = tool.render_args(&ctx);
    assert_eq!(args.len(), 2);
    assert_eq!(args[1], "a b'; rm -rf /");
}

#[test]
fn test_substituted_values_are_not_expanded_again() {
    let mut ctx = context();
    ctx.file = PathBuf::from("/tmp/job/input/x{password}{workdir}.txt");
    ctx.password = "{wordlist}".to_string();
    let tool = ToolSpec::new("steghide", "steghide", &["info", "{file}", "-p", "{password}"]);

    assert_eq!(
        tool.render_args(&ctx),
        vec![
            "info",
            "/tmp/job/input/x{password}{workdir}.txt",
            "-p",
            "{wordlist}"
        ]
    );
}

#[test]
fn test_unknown_placeholders_and_stray_braces_are_kept() {
    let tool = ToolSpec::new("t", "t", &["{nope}", "{{file}}", "a}b{", "{file}{file}"]);

    assert_eq!(
        tool.render_args(&context()),
        vec![
            "{nope}",
            "{/tmp/job/input/cat.png}",
            "a}b{",
            "/tmp/job/input/cat.png/tmp/job/input/cat.png"
        ]
    );
}

#[test]
fn test_default_battery_order_and_flags() {
    let battery = default_battery();
    let names: Vec<&str> = battery.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "cat", "strings", "binwalk", "foremost", "zsteg", "steghide", "stegseek", "outguess",
            "exiftool", "pngcheck", "stegsolve"
        ]
    );

    let stegsolve = battery.iter().find(|t| t.name == "stegsolve").unwrap();
    assert!(!stegsolve.enabled);
    assert!(battery.iter().filter(|t| t.name != "stegsolve").all(|t| t.enabled));
}

#[test]
fn test_foremost_lists_its_output_dir() {
    let battery = default_battery();
    let foremost = battery.iter().find(|t| t.name == "foremost").unwrap();
    assert_eq!(
        foremost.capture,
        Capture::ListDir {
            dir: "foremost_out".to_string()
        }
    );
}

#[test]
fn test_capture_deserializes_from_toml() {
    let tool: ToolSpec = toml::from_str(
        r#"
name = "outguess"
program = "outguess"
args = ["-r", "{file}", "{workdir}/out"]
capture = { kind = "read_file", file = "out" }
timeout_secs = 10
"#,
    )
    .unwrap();

    assert_eq!(
        tool.capture,
        Capture::ReadFile {
            file: "out".to_string()
        }
    );
    assert_eq!(tool.timeout_secs, Some(10));
    assert!(tool.enabled);
}

#[test]
fn test_is_available() {
    assert!(ToolSpec::new("sh", "sh", &["{file}"]).is_available());
    assert!(!ToolSpec::new("nope", "nonexistent_command_12345", &["{file}"]).is_available());
}

#[test]
fn test_info_reports_availability() {
    let info = ToolSpec::new("missing", "nonexistent_command_12345", &["{file}"])
        .with_description("never installed")
        .info();

    assert_eq!(info.name, "missing");
    assert_eq!(info.description, "never installed");
    assert!(info.enabled);
    assert!(!info.available);
}
