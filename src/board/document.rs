//! JSON wire format of the persisted project and its validated conversion.
//!
//! Documents written by older releases are accepted: progress and issue
//! numbers stored as strings, sprint dates stored as free text, and the
//! extra `repo_url` / `dev_list` keys.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::developers::DeveloperDirectory;
use super::models::{
    Progress, ProgressSnapshot, Scrum, SprintDate, TaskId, TaskRecord, from_epoch_seconds,
    to_epoch_seconds,
};
use super::project::Project;
use super::sprint::Sprint;
use crate::errors::RepoError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    pub sprint_list: Vec<SprintDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintDocument {
    pub sprint_number: u32,
    pub sprint_date: DateValue,
    pub sprint_active: bool,
    pub sprint_task_list: Vec<TaskDocument>,
    /// Developers holding tasks in the sprint. Recomputed on load.
    #[serde(default)]
    pub dev_list: Vec<String>,
    pub scrum_list: Vec<ScrumDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    pub task_id: String,
    #[serde(deserialize_with = "loose_u64")]
    pub issue: u64,
    pub devel: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub date: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrumDocument {
    pub scrum_number: u32,
    pub scrum_active: bool,
    #[serde(default)]
    pub scrum_task_list: Vec<SnapshotDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub task_id: String,
    #[serde(deserialize_with = "loose_u64")]
    pub progress: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub blocker: String,
    #[serde(default)]
    pub today: bool,
    #[serde(default)]
    pub date: f64,
}

/// A sprint start date: epoch seconds, or a label from hand-edited documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Epoch(i64),
    Fractional(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(u64),
    Text(String),
}

fn loose_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match LooseNumber::deserialize(deserializer)? {
        LooseNumber::Int(n) => Ok(n),
        LooseNumber::Text(s) if s.trim().is_empty() => Ok(0),
        LooseNumber::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{}'", s))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProjectDocument {
    /// A project with no sprints yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo_url: None,
            sprint_list: Vec::new(),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, RepoError> {
        serde_json::from_slice(bytes).map_err(|e| RepoError::InvalidDocument(e.to_string()))
    }

    /// Pretty JSON with a trailing newline, the form written to disk.
    pub fn to_json(&self) -> Result<String, RepoError> {
        let mut json =
            serde_json::to_string_pretty(self).map_err(|e| RepoError::InvalidDocument(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }
}

fn invalid(msg: String) -> RepoError {
    RepoError::InvalidDocument(msg)
}

impl Project {
    /// Build the aggregate from a document, rejecting anything that breaks
    /// its invariants.
    pub fn from_document(
        doc: ProjectDocument,
        directory: DeveloperDirectory,
    ) -> Result<Project, RepoError> {
        if doc.name.trim().is_empty() {
            return Err(invalid("project has no name".to_string()));
        }

        let count = doc.sprint_list.len();
        let mut sprints = Vec::with_capacity(count);
        for (i, sprint) in doc.sprint_list.into_iter().enumerate() {
            let expected = i as u32 + 1;
            if sprint.sprint_number != expected {
                return Err(invalid(format!(
                    "sprint {} found where sprint {} was expected",
                    sprint.sprint_number, expected
                )));
            }
            if sprint.sprint_active && i + 1 != count {
                return Err(invalid(format!(
                    "sprint {} is active but is not the last sprint",
                    expected
                )));
            }
            sprints.push(sprint_from_document(sprint)?);
        }

        Ok(Project::from_parts(doc.name, sprints, directory))
    }

    pub fn to_document(&self, repo_url: Option<&str>) -> ProjectDocument {
        ProjectDocument {
            name: self.name.clone(),
            repo_url: repo_url.map(str::to_string),
            sprint_list: self.sprints.iter().map(sprint_to_document).collect(),
        }
    }
}

fn sprint_from_document(doc: SprintDocument) -> Result<Sprint, RepoError> {
    let number = doc.sprint_number;

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(doc.sprint_task_list.len());
    for task in doc.sprint_task_list {
        if !seen.insert(task.task_id.clone()) {
            return Err(invalid(format!(
                "sprint {} lists task {} twice",
                number, task.task_id
            )));
        }
        tasks.push(TaskRecord {
            id: TaskId::from(task.task_id),
            issue: task.issue,
            developer: task.devel,
            description: task.desc,
            created_at: from_epoch_seconds(task.date),
        });
    }

    if doc.scrum_list.is_empty() {
        return Err(invalid(format!("sprint {} has no scrum 0", number)));
    }
    let last = doc.scrum_list.len() - 1;
    let mut scrums = Vec::with_capacity(doc.scrum_list.len());
    for (i, scrum) in doc.scrum_list.into_iter().enumerate() {
        if scrum.scrum_number != i as u32 {
            return Err(invalid(format!(
                "sprint {}: scrum {} found where scrum {} was expected",
                number, scrum.scrum_number, i
            )));
        }
        if scrum.scrum_active && (i == 0 || i != last || !doc.sprint_active) {
            return Err(invalid(format!(
                "sprint {}: scrum {} cannot be active",
                number, i
            )));
        }
        scrums.push(scrum_from_document(number, scrum)?);
    }

    let started = match doc.sprint_date {
        DateValue::Epoch(secs) => SprintDate::Started(from_epoch_seconds(secs as f64)),
        DateValue::Fractional(secs) => SprintDate::Started(from_epoch_seconds(secs)),
        DateValue::Text(label) => SprintDate::Label(label),
    };

    Ok(Sprint::new(number, started, doc.sprint_active, tasks, scrums))
}

fn scrum_from_document(sprint: u32, doc: ScrumDocument) -> Result<Scrum, RepoError> {
    let mut scrum = Scrum::new(doc.scrum_number, doc.scrum_active);
    let mut seen = HashSet::new();
    for snap in doc.scrum_task_list {
        if !seen.insert(snap.task_id.clone()) {
            return Err(invalid(format!(
                "sprint {} scrum {}: task {} reported twice",
                sprint, doc.scrum_number, snap.task_id
            )));
        }
        let progress = u32::try_from(snap.progress)
            .ok()
            .and_then(Progress::new)
            .ok_or_else(|| {
                invalid(format!(
                    "sprint {} scrum {}: progress {} of task {} is out of range",
                    sprint, doc.scrum_number, snap.progress, snap.task_id
                ))
            })?;
        scrum.snapshots.push(ProgressSnapshot {
            task_id: TaskId::from(snap.task_id),
            progress,
            blocker: snap.blocker,
            today: snap.today,
            submitted_at: from_epoch_seconds(snap.date),
        });
    }
    Ok(scrum)
}

fn sprint_to_document(sprint: &Sprint) -> SprintDocument {
    SprintDocument {
        sprint_number: sprint.number,
        sprint_date: match &sprint.started {
            SprintDate::Started(at) => DateValue::Epoch(at.timestamp()),
            SprintDate::Label(label) => DateValue::Text(label.clone()),
        },
        sprint_active: sprint.active,
        sprint_task_list: sprint
            .tasks
            .iter()
            .map(|t| TaskDocument {
                task_id: t.id.to_string(),
                issue: t.issue,
                devel: t.developer.clone(),
                desc: t.description.clone(),
                date: to_epoch_seconds(t.created_at),
            })
            .collect(),
        dev_list: sprint.developers().to_vec(),
        scrum_list: sprint
            .scrums
            .iter()
            .map(|s| ScrumDocument {
                scrum_number: s.number,
                scrum_active: s.active,
                scrum_task_list: s
                    .snapshots
                    .iter()
                    .map(|p| SnapshotDocument {
                        task_id: p.task_id.to_string(),
                        progress: u64::from(p.progress.get()),
                        blocker: p.blocker.clone(),
                        today: p.today,
                        date: to_epoch_seconds(p.submitted_at),
                    })
                    .collect(),
            })
            .collect(),
    }
}
