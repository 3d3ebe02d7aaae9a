//! Sample staging
//!
//! Every analysis gets its own scratch directory. The sample is written to
//! `<workdir>/input/<name>` so tool output directories (`foremost_out`, ...)
//! can never collide with it. Dropping the [`Sample`] removes everything.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

const FALLBACK_NAME: &str = "upload.bin";

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),

    #[error("Failed to download '{0}': no such object in storage")]
    NotFound(String),

    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A staged sample and the scratch directory that owns it
#[derive(Debug)]
pub struct Sample {
    dir: TempDir,
    path: PathBuf,
    name: String,
    size: u64,
}

impl Sample {
    /// Stage raw bytes under a sanitized file name
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, SampleError> {
        let dir = tempfile::Builder::new().prefix("stegproc-").tempdir()?;
        let name = sanitize_file_name(name);

        let input_dir = dir.path().join("input");
        fs::create_dir(&input_dir)?;
        let path = input_dir.join(&name);
        fs::write(&path, bytes)?;

        debug!("Staged {} ({} bytes) at {}", name, bytes.len(), path.display());

        Ok(Self {
            dir,
            path,
            name,
            size: bytes.len() as u64,
        })
    }

    /// Stage base64 data, accepting an optional `data:...;base64,` prefix
    pub fn from_base64(name: &str, data: &str) -> Result<Self, SampleError> {
        let encoded = match data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => data,
        };

        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| SampleError::InvalidBase64(e.to_string()))?;

        Self::from_bytes(name, &bytes)
    }

    /// Stage a copy of an object from the local store
    pub fn from_storage(root: &Path, key: &str) -> Result<Self, SampleError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(SampleError::InvalidKey(key.to_string()));
        }

        let source = root.join(relative);
        if !source.is_file() {
            return Err(SampleError::NotFound(key.to_string()));
        }

        let bytes = fs::read(&source)?;
        Self::from_bytes(key, &bytes)
    }

    /// Stage a copy of a file on disk
    pub fn from_path(path: &Path) -> Result<Self, SampleError> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(&name, &bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workdir(&self) -> &Path {
        self.dir.path()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Reduce a client-supplied name to a safe base name
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("uploads/flag.jpg"), "flag.jpg");
    }

    #[test]
    fn test_sanitize_falls_back_for_empty_names() {
        assert_eq!(sanitize_file_name(""), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("dir/"), FALLBACK_NAME);
        assert_eq!(sanitize_file_name(".."), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("  \n"), FALLBACK_NAME);
    }

    #[test]
    fn test_from_bytes_stages_under_input() {
        let sample = Sample::from_bytes("cat.png", b"\x89PNG").unwrap();

        assert_eq!(sample.name(), "cat.png");
        assert_eq!(sample.size(), 4);
        assert_eq!(sample.path(), sample.workdir().join("input").join("cat.png"));
        assert_eq!(fs::read(sample.path()).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_drop_removes_workdir() {
        let sample = Sample::from_bytes("x", b"data").unwrap();
        let workdir = sample.workdir().to_path_buf();
        assert!(workdir.exists());

        drop(sample);
        assert!(!workdir.exists());
    }

    #[test]
    fn test_from_base64_plain_and_data_url() {
        let sample = Sample::from_base64("a.txt", "aGVsbG8=").unwrap();
        assert_eq!(fs::read(sample.path()).unwrap(), b"hello");

        let sample = Sample::from_base64("a.txt", "data:text/plain;base64,aGVs\nbG8=").unwrap();
        assert_eq!(fs::read(sample.path()).unwrap(), b"hello");
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        let err = Sample::from_base64("a.txt", "not base64!!").unwrap_err();
        assert!(matches!(err, SampleError::InvalidBase64(_)));
    }

    #[test]
    fn test_from_storage() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("ctf")).unwrap();
        fs::write(root.path().join("ctf").join("flag.jpg"), b"jpeg").unwrap();

        let sample = Sample::from_storage(root.path(), "ctf/flag.jpg").unwrap();
        assert_eq!(sample.name(), "flag.jpg");
        assert_eq!(fs::read(sample.path()).unwrap(), b"jpeg");
    }

    #[test]
    fn test_from_storage_rejects_traversal() {
        let root = TempDir::new().unwrap();

        for key in ["../secret", "/etc/passwd", "a/../../b", ""] {
            let err = Sample::from_storage(root.path(), key).unwrap_err();
            assert!(matches!(err, SampleError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[test]
    fn test_from_storage_missing_object() {
        let root = TempDir::new().unwrap();
        let err = Sample::from_storage(root.path(), "missing.png").unwrap_err();

        assert!(matches!(err, SampleError::NotFound(_)));
        assert!(err.to_string().contains("Failed to download 'missing.png'"));
    }
}
