//! Issue tracker lookups for task-add requests.

pub mod gitlab;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SprintviewToml;
use crate::errors::TrackerError;

pub use gitlab::GitLabTracker;

/// The fields of an issue the board cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerIssue {
    pub iid: u64,
    pub title: String,
    pub assignee: Option<String>,
    pub author: Option<String>,
}

impl TrackerIssue {
    /// Login of the developer owning the issue: the assignee, else the author.
    pub fn developer(&self) -> Result<&str, TrackerError> {
        self.assignee
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.author.as_deref().filter(|s| !s.is_empty()))
            .ok_or(TrackerError::NoAssignee(self.iid))
    }
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_issue(&self, iid: u64) -> Result<TrackerIssue, TrackerError>;
}

pub fn open_tracker(config: &SprintviewToml) -> Result<Arc<dyn IssueTracker>, TrackerError> {
    Ok(Arc::new(GitLabTracker::new(&config.tracker, config.token.clone())?))
}

/// Fixed set of issues held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTracker {
    issues: HashMap<u64, TrackerIssue>,
}

impl StaticTracker {
    pub fn new(issues: impl IntoIterator<Item = TrackerIssue>) -> Self {
        Self {
            issues: issues.into_iter().map(|i| (i.iid, i)).collect(),
        }
    }

    pub fn insert(&mut self, issue: TrackerIssue) {
        self.issues.insert(issue.iid, issue);
    }
}

#[async_trait]
impl IssueTracker for StaticTracker {
    async fn fetch_issue(&self, iid: u64) -> Result<TrackerIssue, TrackerError> {
        self.issues
            .get(&iid)
            .cloned()
            .ok_or(TrackerError::NotFound(iid))
    }
}
