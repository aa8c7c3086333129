//! Where the project document lives.
//!
//! The whole project is loaded and saved as one JSON document. The local
//! file is preferred whenever it is readable; otherwise the document is
//! read from, and saved back to, a file in a GitLab repository.

pub mod file;
pub mod gitlab;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::board::ProjectDocument;
use crate::config::SprintviewToml;
use crate::errors::RepoError;

pub use file::FileRepository;
pub use gitlab::GitLabRepository;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Human-readable location of the document, also stored as `repo_url`.
    fn origin(&self) -> String;

    async fn load(&self) -> Result<ProjectDocument, RepoError>;

    async fn save(&self, doc: &ProjectDocument) -> Result<(), RepoError>;
}

/// Pick the data source: the local file when it exists, else the remote store.
pub fn open_repository(config: &SprintviewToml) -> Result<Arc<dyn ProjectRepository>, RepoError> {
    let path = &config.data.path;
    if path.is_file() {
        info!(path = %path.display(), "Data source FILE");
        Ok(Arc::new(FileRepository::new(path)))
    } else {
        let remote = GitLabRepository::new(
            &config.remote,
            config.token.clone(),
            config.data.backup_path.clone(),
        )?;
        info!(origin = %remote.origin(), "Data source URL");
        Ok(Arc::new(remote))
    }
}

/// Repository kept in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    doc: Mutex<Option<ProjectDocument>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryRepository {
    pub fn new(doc: ProjectDocument) -> Self {
        Self {
            doc: Mutex::new(Some(doc)),
            ..Default::default()
        }
    }

    /// Make every following save fail with `PersistFailure`.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn document(&self) -> Option<ProjectDocument> {
        self.doc.lock().await.clone()
    }
}

#[async_trait]
impl ProjectRepository for MemoryRepository {
    fn origin(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<ProjectDocument, RepoError> {
        self.doc
            .lock()
            .await
            .clone()
            .ok_or_else(|| RepoError::unavailable("memory", "no document stored"))
    }

    async fn save(&self, doc: &ProjectDocument) -> Result<(), RepoError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::persist("memory", "save rejected"));
        }
        *self.doc.lock().await = Some(doc.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_repository_round_trip() {
        let repo = MemoryRepository::default();
        assert!(matches!(
            repo.load().await,
            Err(RepoError::DataUnavailable { .. })
        ));

        repo.save(&ProjectDocument::empty("demo")).await.unwrap();
        assert_eq!(repo.load().await.unwrap().name, "demo");
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_repository_failing_saves() {
        let repo = MemoryRepository::new(ProjectDocument::empty("demo"));
        repo.fail_saves(true);
        let err = repo.save(&ProjectDocument::empty("other")).await.unwrap_err();
        assert!(matches!(err, RepoError::PersistFailure { .. }));
        assert_eq!(repo.load().await.unwrap().name, "demo");
    }

    #[test]
    fn test_open_repository_prefers_readable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project_data");
        std::fs::write(&path, "{}").unwrap();

        let mut config = SprintviewToml::default();
        config.data.path = path.clone();
        assert_eq!(
            open_repository(&config).unwrap().origin(),
            path.display().to_string()
        );

        config.data.path = dir.path().join("missing");
        assert!(open_repository(&config).unwrap().origin().starts_with("https://"));
    }

    #[test]
    fn test_open_repository_skips_directory() {
        let dir = tempdir().unwrap();
        let mut config = SprintviewToml::default();
        config.data.path = dir.path().to_path_buf();

        let repo = open_repository(&config).unwrap();
        assert_ne!(repo.origin(), dir.path().display().to_string());
        assert!(repo.origin().starts_with("https://"));
    }
}
