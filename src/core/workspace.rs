//! Scoped temporary workspace for one pipeline run.
//!
//! Intermediate files (title card, video) live here. The directory is removed
//! by [`Workspace::release`] or, failing that, when the value is dropped, so
//! early returns, panics and cancelled futures all clean up.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

const PREFIX: &str = "podcast2video-";

/// Errors from acquiring a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("could not create temp directory in {location}: {source}")]
    Create {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// A private temp directory, removed on release or drop
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh directory, under `root` if given, else the system temp dir
    pub fn acquire(root: Option<&Path>) -> Result<Self, WorkspaceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);

        let result = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let dir = result.map_err(|source| WorkspaceError::Create {
            location: root
                .map(|r| r.display().to_string())
                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
            source,
        })?;

        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Workspace acquired");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory and everything under it.
    ///
    /// A removal failure is logged, not returned.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "Workspace removed"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not remove workspace"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_removes_directory_and_contents() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::acquire(Some(root.path())).unwrap();
        let path = workspace.path().to_path_buf();

        assert!(path.starts_with(root.path()));
        std::fs::write(workspace.file("slide.png"), b"png").unwrap();
        std::fs::create_dir(workspace.file("nested")).unwrap();
        std::fs::write(workspace.file("nested/vid.mp4"), b"mp4").unwrap();

        workspace.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::acquire(Some(root.path())).unwrap();
            std::fs::write(workspace.file("slide.png"), b"png").unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_on_panic() {
        let root = TempDir::new().unwrap();
        let root_path = root.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _workspace = Workspace::acquire(Some(&root_path)).unwrap();
            panic!("stage blew up");
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_release_tolerates_already_removed_directory() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::acquire(Some(root.path())).unwrap();
        std::fs::remove_dir_all(workspace.path()).unwrap();
        // Logged, not fatal.
        workspace.release();
    }

    #[test]
    fn test_acquire_in_missing_root_fails() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("does-not-exist");
        let err = Workspace::acquire(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
