use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, error, info};

use super::ProjectRepository;
use crate::board::ProjectDocument;
use crate::errors::RepoError;

/// Project document in a local JSON file.
///
/// Reads take a shared lock and writes an exclusive one. A save writes a
/// sibling temp file and renames it over the document, so a crash never
/// leaves a truncated file behind. Blocking I/O runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `doc` unless the file already exists.
    pub fn create(path: &Path, doc: &ProjectDocument) -> Result<(), RepoError> {
        let origin = path.display().to_string();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| RepoError::persist(&origin, e))?;
        file.write_all(doc.to_json()?.as_bytes())
            .map_err(|e| RepoError::persist(&origin, e))?;
        info!(path = %origin, "Created project document");
        Ok(())
    }

    fn read_blocking(path: &Path) -> Result<ProjectDocument, RepoError> {
        let origin = path.display().to_string();
        let mut file = File::open(path).map_err(|e| RepoError::unavailable(&origin, e))?;
        file.lock_shared()
            .map_err(|e| RepoError::unavailable(&origin, e))?;
        let mut raw = Vec::new();
        let read = file.read_to_end(&mut raw);
        let _ = FileExt::unlock(&file);
        read.map_err(|e| RepoError::unavailable(&origin, e))?;

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(RepoError::unavailable(&origin, "data file is empty"));
        }
        debug!(path = %origin, bytes = raw.len(), "Project document read");
        ProjectDocument::from_json(&raw)
    }

    fn write_blocking(path: &Path, json: &str) -> Result<(), RepoError> {
        let origin = path.display().to_string();
        let persist = |e: std::io::Error| RepoError::persist(&origin, e);

        // The lock lives on the document itself, which the rename replaces;
        // take it on a stable sidecar instead.
        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(persist)?;
        lock.lock_exclusive().map_err(persist)?;

        let tmp = path.with_extension("tmp");
        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();
        let _ = FileExt::unlock(&lock);

        result.map_err(|e| {
            error!(path = %origin, error = %e, "Failed to save project document");
            persist(e)
        })
    }
}

#[async_trait]
impl ProjectRepository for FileRepository {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<ProjectDocument, RepoError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_blocking(&path))
            .await
            .map_err(|e| RepoError::unavailable(self.origin(), e))?
    }

    async fn save(&self, doc: &ProjectDocument) -> Result<(), RepoError> {
        let json = doc.to_json()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::write_blocking(&path, &json))
            .await
            .map_err(|e| RepoError::persist(self.origin(), e))??;
        info!(path = %self.path.display(), "Project document saved");
        Ok(())
    }
}
