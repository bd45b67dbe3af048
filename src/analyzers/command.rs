//! External-process analyzer.
//!
//! Runs a program with the artifact path as its last argument and parses
//! its stdout as JSON. Metadata tools, certificate checkers and model
//! scripts are all wired in this way.
//!
//! # Requirements
//!
//! - The artifact must be on disk; in-memory artifacts are rejected.
//! - The program must print a single JSON document. A top-level array is
//!   reduced to its first element (the `exiftool -j` shape).

use crate::core::{Analyzer, Artifact, StageError, StageOutput};

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Bytes of stderr kept in failure messages.
const STDERR_TAIL: usize = 512;

/// An analyzer backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl CommandAnalyzer {
    /// Creates an analyzer for stage `name` running `program`.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    /// `exiftool -j` as the `exif` stage.
    pub fn exiftool() -> Self {
        Self::new("exif", "exiftool").arg("-j")
    }

    /// Appends an argument placed before the artifact path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the child's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Returns the program path.
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn parse_stdout(&self, stdout: &[u8]) -> Result<StageOutput, StageError> {
        let value: Value = serde_json::from_slice(stdout)
            .map_err(|e| StageError::malformed(&self.name, format!("stdout is not JSON: {e}")))?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| StageError::malformed(&self.name, "empty JSON array")),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, artifact: &Artifact) -> Result<StageOutput, StageError> {
        let path = artifact.as_path().ok_or_else(|| StageError::UnsupportedInput {
            stage: self.name.clone(),
            input: "in-memory",
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::trace!(
            stage = %self.name,
            program = %self.program.display(),
            artifact = %path.display(),
            "Spawning analyzer process"
        );

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StageError::failed(
                    &self.name,
                    format!("program not found: {}", self.program.display()),
                )
            } else {
                StageError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let trimmed = stderr.trim();
            let tail = match trimmed.char_indices().rev().nth(STDERR_TAIL) {
                Some((idx, _)) => &trimmed[idx..],
                None => trimmed,
            };
            return Err(StageError::failed(
                &self.name,
                format!("exited with {}: {}", output.status, tail),
            ));
        }

        self.parse_stdout(&output.stdout)
    }

    fn supports_bytes(&self) -> bool {
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;

    fn cat_analyzer() -> CommandAnalyzer {
        // `sh -c script path` binds the artifact path to $0
        CommandAnalyzer::new("exif", "sh").args(["-c", "cat \"$0\""])
    }

    fn artifact_with(contents: &str) -> (tempfile::NamedTempFile, Artifact) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let artifact = Artifact::from_path(file.path());
        (file, artifact)
    }

    #[tokio::test]
    async fn test_parses_stdout_json() {
        let (_file, artifact) = artifact_with(r#"{"ai_probability": 0.25}"#);
        let output = cat_analyzer().analyze(&artifact).await.unwrap();
        assert_eq!(output["ai_probability"], 0.25);
    }

    #[tokio::test]
    async fn test_array_reduced_to_first_element() {
        let (_file, artifact) = artifact_with(r#"[{"Software": "Midjourney"}, {"x": 1}]"#);
        let output = cat_analyzer().analyze(&artifact).await.unwrap();
        assert_eq!(output["Software"], "Midjourney");

        let (_file, empty) = artifact_with("[]");
        let err = cat_analyzer().analyze(&empty).await.unwrap_err();
        assert!(matches!(err, StageError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_non_json_is_malformed() {
        let (_file, artifact) = artifact_with("not json");
        let err = cat_analyzer().analyze(&artifact).await.unwrap_err();
        assert!(matches!(err, StageError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let (_file, artifact) = artifact_with("{}");
        let analyzer = CommandAnalyzer::new("c2pa", "sh").args(["-c", "echo broken >&2; exit 3"]);
        let err = analyzer.analyze(&artifact).await.unwrap_err();
        assert_eq!(err.stage(), Some("c2pa"));
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_missing_program_and_bytes_input() {
        let (_file, artifact) = artifact_with("{}");
        let missing = CommandAnalyzer::new("ai-model", "/nonexistent/evidencefuse-classifier");
        let err = missing.analyze(&artifact).await.unwrap_err();
        assert!(err.to_string().contains("program not found"));

        let bytes = Artifact::from_bytes(b"{}".to_vec());
        let err = cat_analyzer().analyze(&bytes).await.unwrap_err();
        assert!(matches!(err, StageError::UnsupportedInput { .. }));
        assert!(!cat_analyzer().supports_bytes());
    }
}
