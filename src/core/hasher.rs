//! Content fingerprinting with BLAKE3.
//!
//! The fingerprint is computed over artifact bytes only, so the same image
//! uploaded under two different names maps to the same cache key.

use crate::core::error::AnalysisError;
use crate::core::input::Artifact;
use crate::core::types::Fingerprint;

use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Computes content fingerprints for artifacts.
///
/// Files are streamed through the hasher in 64 KiB chunks, so large
/// artifacts are never loaded into memory in one piece.
#[derive(Debug, Clone, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self
    }

    /// Fingerprints a byte slice.
    pub fn hash_bytes(&self, data: &[u8]) -> Fingerprint {
        Fingerprint::from_hex(blake3::hash(data).to_hex().to_string())
    }

    /// Fingerprints a file on disk.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint, AnalysisError> {
        let file = std::fs::File::open(path)
            .map_err(|e| AnalysisError::artifact_io(path.display().to_string(), e))?;
        let mut reader = std::io::BufReader::new(file);
        self.hash_reader(&mut reader)
            .map_err(|e| AnalysisError::artifact_io(path.display().to_string(), e))
    }

    /// Fingerprints everything a reader yields.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<Fingerprint> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(Fingerprint::from_hex(hasher.finalize().to_hex().to_string()))
    }

    /// Fingerprints an artifact without blocking the async runtime.
    pub async fn hash_artifact(&self, artifact: &Artifact) -> Result<Fingerprint, AnalysisError> {
        match artifact {
            Artifact::Bytes { data, .. } => Ok(self.hash_bytes(data)),
            Artifact::Path(path) => {
                let path = path.clone();
                let hasher = self.clone();
                tokio::task::spawn_blocking(move || hasher.hash_file(&path))
                    .await
                    .map_err(|e| AnalysisError::internal(format!("hashing task failed: {e}")))?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_deterministic() {
        let hasher = ContentHasher::new();
        assert_eq!(hasher.hash_bytes(b"pixels"), hasher.hash_bytes(b"pixels"));
        assert_ne!(hasher.hash_bytes(b"pixels"), hasher.hash_bytes(b"pixelz"));
    }

    #[test]
    fn test_file_and_bytes_agree() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"same content").unwrap();

        let hasher = ContentHasher::new();
        let from_file = hasher.hash_file(file.path()).unwrap();
        assert_eq!(from_file, hasher.hash_bytes(b"same content"));
    }

    #[tokio::test]
    async fn test_path_is_not_part_of_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("renamed-copy.jpg");
        std::fs::write(&a, b"identical bytes").unwrap();
        std::fs::write(&b, b"identical bytes").unwrap();

        let hasher = ContentHasher::new();
        let fa = hasher.hash_artifact(&Artifact::from_path(&a)).await.unwrap();
        let fb = hasher.hash_artifact(&Artifact::from_path(&b)).await.unwrap();
        assert_eq!(fa, fb);
    }

    #[tokio::test]
    async fn test_missing_file_is_artifact_error() {
        let hasher = ContentHasher::new();
        let err = hasher
            .hash_artifact(&Artifact::from_path("/no/such/artifact.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ArtifactNotFound { .. }));
    }
}
