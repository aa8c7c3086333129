use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use super::{IssueTracker, TrackerIssue};
use crate::config::TrackerSection;
use crate::errors::TrackerError;

/// Issues of one GitLab project, looked up by project-scoped `iid`.
#[derive(Debug, Clone)]
pub struct GitLabTracker {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabIssue {
    iid: u64,
    title: String,
    assignee: Option<GitLabUser>,
    author: Option<GitLabUser>,
}

impl From<GitLabIssue> for TrackerIssue {
    fn from(issue: GitLabIssue) -> Self {
        Self {
            iid: issue.iid,
            title: issue.title,
            assignee: issue.assignee.and_then(|u| u.username),
            author: issue.author.and_then(|u| u.username),
        }
    }
}

impl GitLabTracker {
    pub fn new(config: &TrackerSection, token: Option<String>) -> Result<Self, TrackerError> {
        let mut builder = reqwest::Client::builder().user_agent("sprintview");
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| TrackerError::Unavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: issues_url(&config.base_url, &config.project_id),
            token,
        })
    }
}

pub fn issues_url(base_url: &str, project_id: &str) -> String {
    format!(
        "{}/projects/{}/issues",
        base_url.trim_end_matches('/'),
        project_id.replace('/', "%2F")
    )
}

#[async_trait]
impl IssueTracker for GitLabTracker {
    async fn fetch_issue(&self, iid: u64) -> Result<TrackerIssue, TrackerError> {
        let mut req = self
            .client
            .get(&self.url)
            .query(&[("iids[]", iid.to_string())]);
        if let Some(token) = &self.token {
            req = req.header("PRIVATE-TOKEN", token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TrackerError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            error!(url = %self.url, %status, "Failed to query issue tracker");
            return Err(TrackerError::Unavailable(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let issues: Vec<GitLabIssue> = resp
            .json()
            .await
            .map_err(|e| TrackerError::Unavailable(format!("bad issue list: {}", e)))?;
        debug!(iid, found = issues.len(), "Issue lookup");
        issues
            .into_iter()
            .find(|i| i.iid == iid)
            .map(TrackerIssue::from)
            .ok_or(TrackerError::NotFound(iid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::{Json, Router, routing::get};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn section(base_url: String) -> TrackerSection {
        TrackerSection {
            base_url,
            project_id: "9".into(),
            issue_url: String::new(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_issues_url() {
        assert_eq!(
            issues_url("https://gitlab.com/api/v4/", "1090162"),
            "https://gitlab.com/api/v4/projects/1090162/issues"
        );
    }

    #[tokio::test]
    async fn test_fetch_issue_maps_usernames() {
        let router = Router::new().route(
            "/projects/9/issues",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let body = match q.get("iids[]").map(String::as_str) {
                    Some("55") => serde_json::json!([{
                        "iid": 55,
                        "title": "Search page",
                        "assignee": null,
                        "author": { "username": "bob" }
                    }]),
                    _ => serde_json::json!([]),
                };
                Json(body)
            }),
        );
        let tracker = GitLabTracker::new(&section(serve(router).await), Some("t".into())).unwrap();

        let issue = tracker.fetch_issue(55).await.unwrap();
        assert_eq!(issue.title, "Search page");
        assert_eq!(issue.developer().unwrap(), "bob");
        assert!(matches!(
            tracker.fetch_issue(56).await,
            Err(TrackerError::NotFound(56))
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let tracker = GitLabTracker::new(&section(serve(Router::new()).await), None).unwrap();
        let err = tracker.fetch_issue(1).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
