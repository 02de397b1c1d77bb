use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Scratch directory where uploaded forms and converter output live for the
/// duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The workspace root itself, for forms placed there ahead of time.
    pub fn shared(&self) -> WorkspaceScope {
        WorkspaceScope {
            dir: self.root.clone(),
            private: false,
        }
    }

    /// A directory owned by a single upload. `run_id` must be generated by the
    /// server so no two uploads share it.
    pub fn for_upload(&self, run_id: Uuid) -> WorkspaceScope {
        WorkspaceScope {
            dir: self.root.join(run_id.to_string()),
            private: true,
        }
    }
}

/// The part of the workspace one pipeline run may read, write and clean.
#[derive(Debug, Clone)]
pub struct WorkspaceScope {
    dir: PathBuf,
    private: bool,
}

impl WorkspaceScope {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Writes `content` under `filename`, creating the directory on first use and
    /// replacing any file already stored under that name.
    pub async fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create workspace {}", self.dir.display()))?;

        let path = self.path_of(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Replacing existing {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
            }
        }

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub async fn contains(&self, filename: &str) -> bool {
        tokio::fs::try_exists(self.path_of(filename))
            .await
            .unwrap_or(false)
    }

    /// Lists what is currently in the scope. A directory that does not exist yet is empty.
    pub async fn entries(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }

    /// Deletes the scope's files and returns how many were removed.
    ///
    /// Never fails: problems are logged and skipped. The shared scope leaves
    /// subdirectories alone since those belong to requests still in flight; a private
    /// scope removes everything, then its own directory.
    pub async fn clear(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!("Could not list workspace {}: {}", self.dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopped cleaning {}: {}", self.dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let result = if is_dir {
                if !self.private {
                    continue;
                }
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };

            match result {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        if self.private {
            if let Err(e) = tokio::fs::remove_dir(&self.dir).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", self.dir.display(), e);
                }
            }
        }

        tracing::debug!("Removed {} entries from {}", removed, self.dir.display());
        removed
    }
}
