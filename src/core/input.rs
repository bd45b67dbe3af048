//! Artifact input abstraction.
//!
//! An [`Artifact`] is what flows through the pipeline: either a file on disk
//! (the common case, and the only form external tools can consume) or an
//! in-memory buffer.

use crate::core::error::AnalysisError;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An artifact to analyze, given as a path or as bytes.
///
/// Bytes are shared behind an `Arc` so the artifact can be handed to many
/// concurrent stages without copying.
///
/// # Examples
///
/// ```rust
/// use evidencefuse::core::Artifact;
///
/// let on_disk = Artifact::from_path("/uploads/cat.jpg");
/// assert_eq!(on_disk.filename(), Some("cat.jpg"));
///
/// let in_memory = Artifact::from_bytes(vec![0xFF, 0xD8, 0xFF]).with_filename("cat.jpg");
/// assert_eq!(in_memory.size_hint(), Some(3));
/// ```
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A file on disk.
    Path(PathBuf),

    /// In-memory bytes with optional filename.
    Bytes {
        /// The artifact data.
        data: Arc<[u8]>,
        /// Optional original filename.
        filename: Option<String>,
    },
}

impl Artifact {
    /// Creates an artifact from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates an artifact from bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            data: Arc::from(data.into()),
            filename: None,
        }
    }

    /// Sets the filename for byte artifacts. Paths keep their own name.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        if let Self::Bytes { filename, .. } = &mut self {
            *filename = Some(name.into());
        }
        self
    }

    /// Returns the filename, if known.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Path(path) => path.file_name().and_then(|n| n.to_str()),
            Self::Bytes { filename, .. } => filename.as_deref(),
        }
    }

    /// Returns the size in bytes when it is known without touching the disk.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Path(_) => None,
            Self::Bytes { data, .. } => Some(data.len() as u64),
        }
    }

    /// Returns the path, if this is a path-based artifact.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes { .. } => None,
        }
    }

    /// Returns the bytes, if this is an in-memory artifact.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Path(_) => None,
            Self::Bytes { data, .. } => Some(data),
        }
    }

    /// A printable location for logs and error messages.
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes { filename, data } => match filename {
                Some(name) => format!("<memory:{name}>"),
                None => format!("<memory:{} bytes>", data.len()),
            },
        }
    }

    /// Returns the artifact size, statting the file for path artifacts.
    pub async fn size(&self) -> Result<u64, AnalysisError> {
        match self {
            Self::Path(path) => tokio::fs::metadata(path)
                .await
                .map(|m| m.len())
                .map_err(|e| AnalysisError::artifact_io(path.display().to_string(), e)),
            Self::Bytes { data, .. } => Ok(data.len() as u64),
        }
    }
}

impl From<PathBuf> for Artifact {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Artifact {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for Artifact {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}
