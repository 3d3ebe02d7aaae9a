use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /process`: a storage key or inline base64, not both
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    pub key: Option<String>,
    pub data: Option<String>,
    pub filename: Option<String>,
    pub password: Option<String>,
    pub tools: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    #[serde(default)]
    pub detailed: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub size: u64,
    pub results: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Split a comma-separated tool list, dropping blanks
pub fn parse_tool_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_list() {
        assert_eq!(parse_tool_list("zsteg, binwalk,,"), vec!["zsteg", "binwalk"]);
        assert!(parse_tool_list(" ").is_empty());
    }

    #[test]
    fn test_process_request_fields_are_optional() {
        let req: ProcessRequest = serde_json::from_str(r#"{"key": "a.png"}"#).unwrap();
        assert_eq!(req.key.as_deref(), Some("a.png"));
        assert!(req.data.is_none());
        assert!(req.tools.is_none());
    }
}
