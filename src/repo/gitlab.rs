use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::ProjectRepository;
use crate::board::ProjectDocument;
use crate::config::RemoteSection;
use crate::errors::RepoError;

const USER_AGENT: &str = "sprintview";

/// Project document stored as a file in a GitLab repository, through the
/// repository files API.
#[derive(Debug, Clone)]
pub struct GitLabRepository {
    client: reqwest::Client,
    url: String,
    branch: String,
    token: Option<String>,
    backup_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RepositoryFile {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct UpdateFile<'a> {
    branch: &'a str,
    content: &'a str,
    commit_message: &'a str,
}

impl GitLabRepository {
    pub fn new(
        config: &RemoteSection,
        token: Option<String>,
        backup_path: PathBuf,
    ) -> Result<Self, RepoError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let url = files_url(&config.base_url, &config.project_id, &config.file_path);
        let client = builder
            .build()
            .map_err(|e| RepoError::unavailable(url.as_str(), format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            branch: config.branch.clone(),
            token,
            backup_path,
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let req = self.client.request(method, &self.url);
        match &self.token {
            Some(token) => req.header("PRIVATE-TOKEN", token),
            None => req,
        }
    }

    async fn write_backup(&self, json: &str) {
        match tokio::fs::write(&self.backup_path, json).await {
            Ok(()) => debug!(path = %self.backup_path.display(), "Backup written"),
            Err(e) => warn!(
                path = %self.backup_path.display(),
                error = %e,
                "Failed to write local backup"
            ),
        }
    }
}

/// `{base}/projects/{id}/repository/files/{encoded path}`
pub fn files_url(base_url: &str, project_id: &str, file_path: &str) -> String {
    format!(
        "{}/projects/{}/repository/files/{}",
        base_url.trim_end_matches('/'),
        encode_path_segment(project_id),
        encode_path_segment(file_path)
    )
}

/// Percent-encode everything but RFC 3986 unreserved characters, so a
/// nested file path stays one URL segment.
fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[async_trait]
impl ProjectRepository for GitLabRepository {
    fn origin(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<ProjectDocument, RepoError> {
        let origin = self.origin();
        let resp = self
            .request(reqwest::Method::GET)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| RepoError::unavailable(&origin, e))?;

        let status = resp.status();
        if !status.is_success() {
            error!(url = %origin, %status, "Failed to open project data URL");
            return Err(RepoError::unavailable(&origin, format!("HTTP {}", status)));
        }

        let file: RepositoryFile = resp
            .json()
            .await
            .map_err(|e| RepoError::unavailable(&origin, e))?;
        if file.content.trim().is_empty() {
            return Err(RepoError::unavailable(&origin, "empty json file from repo"));
        }

        // GitLab wraps base64 content at 60 columns.
        let encoded: String = file.content.split_whitespace().collect();
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| RepoError::InvalidDocument(format!("content is not base64: {}", e)))?;
        info!(url = %origin, bytes = raw.len(), "Project document retrieved");
        ProjectDocument::from_json(&raw)
    }

    async fn save(&self, doc: &ProjectDocument) -> Result<(), RepoError> {
        let origin = self.origin();
        let json = doc.to_json()?;
        let body = UpdateFile {
            branch: &self.branch,
            content: &json,
            commit_message: "Update sprint board",
        };

        let resp = self
            .request(reqwest::Method::PUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| RepoError::persist(&origin, e))?;

        let status = resp.status();
        if !status.is_success() {
            error!(url = %origin, %status, "Failed to update project data");
            return Err(RepoError::persist(&origin, format!("HTTP {}", status)));
        }

        info!(url = %origin, "Project document saved");
        self.write_backup(&json).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::get};
    use tempfile::tempdir;

    #[test]
    fn test_files_url_encodes_path() {
        assert_eq!(
            files_url("https://gitlab.com/api/v4/", "2693506", "data/board.json"),
            "https://gitlab.com/api/v4/projects/2693506/repository/files/data%2Fboard%2Ejson"
        );
        assert_eq!(
            files_url("https://gitlab.com/api/v4", "group/app", "x"),
            "https://gitlab.com/api/v4/projects/group%2Fapp/repository/files/x"
        );
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn remote(base_url: String) -> RemoteSection {
        RemoteSection {
            base_url,
            project_id: "7".into(),
            file_path: "board".into(),
            branch: "main".into(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_load_decodes_wrapped_base64() {
        let json = ProjectDocument::empty("remote").to_json().unwrap();
        let encoded = STANDARD.encode(json);
        let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);
        let router = Router::new().route(
            "/projects/7/repository/files/board",
            get(move || {
                let wrapped = wrapped.clone();
                async move { Json(serde_json::json!({ "content": wrapped })) }
            }),
        );

        let dir = tempdir().unwrap();
        let repo = GitLabRepository::new(&remote(serve(router).await), None, dir.path().join("bak")).unwrap();
        assert_eq!(repo.load().await.unwrap().name, "remote");
    }

    #[tokio::test]
    async fn test_save_writes_backup() {
        let router = Router::new().route(
            "/projects/7/repository/files/board",
            axum::routing::put(|| async { Json(serde_json::json!({ "file_path": "board" })) }),
        );
        let dir = tempdir().unwrap();
        let backup = dir.path().join("project_data.bak");
        let repo = GitLabRepository::new(&remote(serve(router).await), Some("t".into()), backup.clone()).unwrap();

        repo.save(&ProjectDocument::empty("remote")).await.unwrap();
        let written = std::fs::read_to_string(&backup).unwrap();
        assert!(written.contains("\"remote\""));
    }

    #[tokio::test]
    async fn test_http_errors_map_to_repo_errors() {
        let dir = tempdir().unwrap();
        let repo = GitLabRepository::new(&remote(serve(Router::new()).await), None, dir.path().join("bak")).unwrap();

        assert!(matches!(
            repo.load().await,
            Err(RepoError::DataUnavailable { .. })
        ));
        assert!(matches!(
            repo.save(&ProjectDocument::empty("x")).await,
            Err(RepoError::PersistFailure { .. })
        ));
    }
}
