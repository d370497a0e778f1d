//! Local state file backend.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;

use super::StorageBackend;
use crate::error::StateError;
use crate::state::PullRequestRef;

/// Atomically replace `target` with `content`.
///
/// The bytes are staged in a temp file in the destination directory and
/// renamed over the target, so a crash never leaves a truncated file. The
/// staging file is removed on every error path when the handle drops.
pub fn atomic_write(target: &Path, content: &[u8]) -> Result<(), StateError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;
    staged
        .persist(target)
        .map_err(|e| StateError::storage("io", format!("rename into {}: {}", target.display(), e.error)))?;
    Ok(())
}

pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StorageBackend for LocalFileBackend {
    fn name(&self) -> &str {
        "local_file"
    }

    async fn fetch(&self, _pull_request: Option<&PullRequestRef>) -> Result<Vec<u8>, StateError> {
        tracing::info!(target: "recce.state", "State file: '{}'", self.path.display());
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StateError::NotFound(self.path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(
        &self,
        bytes: Vec<u8>,
        _pull_request: Option<&PullRequestRef>,
    ) -> Result<String, StateError> {
        let started = Instant::now();
        tracing::info!(target: "recce.state", "Store recce state to '{}'", self.path.display());

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
            .await
            .map_err(|e| StateError::storage("io", format!("write task failed: {e}")))??;

        tracing::info!(
            target: "recce.state",
            "Store state completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(format!("The state file is stored at [{}]", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("state.json");

        atomic_write(&target, b"nested").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"nested");
    }

    #[test]
    fn test_no_staging_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        atomic_write(&target, b"clean").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(temp_dir.path().join("absent.json"));

        let err = backend.fetch(None).await.unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recce_state.json");
        let backend = LocalFileBackend::new(&path);

        let message = backend.store(b"{}".to_vec(), None).await.unwrap();
        assert!(message.contains(&path.display().to_string()));
        assert_eq!(backend.fetch(None).await.unwrap(), b"{}");
    }
}
