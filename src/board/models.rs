use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Composite task identifier, `developer:issue`.
///
/// Two developers may share an issue number; each gets its own task id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(developer: &str, issue: u64) -> Self {
        Self(format!("{}:{}", developer, issue))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A progress percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const DONE: Progress = Progress(100);

    pub fn new(value: u32) -> Option<Self> {
        (value <= 100).then(|| Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Progress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::ZERO);
        }
        s.parse::<u32>()
            .ok()
            .and_then(Progress::new)
            .ok_or_else(|| format!("Invalid progress '{}': expected 0-100", s))
    }
}

/// One unit of work assigned to one developer within a sprint.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub issue: u64,
    pub developer: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(developer: &str, issue: u64, description: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(developer, issue),
            issue,
            developer: developer.to_string(),
            description: description.to_string(),
            created_at,
        }
    }
}

/// A developer's status report for one task within one scrum.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub task_id: TaskId,
    pub progress: Progress,
    pub blocker: String,
    pub today: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ProgressSnapshot {
    pub fn is_blocked(&self) -> bool {
        !self.blocker.is_empty()
    }

    /// Blocked or worked today: the state that follows a task into the next scrum.
    pub fn is_outstanding(&self) -> bool {
        self.is_blocked() || self.today
    }
}

/// One check-in cycle within a sprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Scrum {
    pub number: u32,
    pub active: bool,
    pub snapshots: Vec<ProgressSnapshot>,
}

impl Scrum {
    pub fn new(number: u32, active: bool) -> Self {
        Self {
            number,
            active,
            snapshots: Vec::new(),
        }
    }

    pub fn snapshot(&self, task_id: &TaskId) -> Option<&ProgressSnapshot> {
        self.snapshots.iter().find(|s| &s.task_id == task_id)
    }

    /// Insert a snapshot, overwriting in place any earlier one for the same task.
    pub fn upsert(&mut self, snapshot: ProgressSnapshot) {
        match self
            .snapshots
            .iter_mut()
            .find(|s| s.task_id == snapshot.task_id)
        {
            Some(existing) => *existing = snapshot,
            None => self.snapshots.push(snapshot),
        }
    }
}

/// When a sprint began.
///
/// Older documents carry a free-text label instead of a timestamp; those are
/// shown verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum SprintDate {
    Started(DateTime<Utc>),
    Label(String),
}

impl SprintDate {
    /// `Mon D` for dates in the year of `now`, `Mon D YY` otherwise.
    pub fn label(&self, now: DateTime<Utc>) -> String {
        match self {
            SprintDate::Started(at) if at.year() == now.year() => at.format("%b %-d").to_string(),
            SprintDate::Started(at) => at.format("%b %-d %y").to_string(),
            SprintDate::Label(label) => label.clone(),
        }
    }
}

/// Numeric details of a task as of a target scrum.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDetails {
    /// Progress reported in the target scrum, zero if none.
    pub progress: u8,
    /// Last progress reported in an earlier scrum, zero if none.
    pub previous: u8,
    pub blocker: String,
    pub today: bool,
}

impl TaskDetails {
    /// Current progress when reported, otherwise the previous one.
    pub fn best_known(&self) -> u8 {
        if self.progress != 0 {
            self.progress
        } else {
            self.previous
        }
    }
}

/// Convert epoch seconds (possibly fractional) as stored in project documents.
pub fn from_epoch_seconds(secs: f64) -> DateTime<Utc> {
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole, nanos).unwrap_or_default()
}

pub fn to_epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(id: &str, progress: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            task_id: TaskId::from(id),
            progress: Progress::new(progress).unwrap(),
            blocker: String::new(),
            today: false,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_id_is_developer_and_issue() {
        assert_eq!(TaskId::new("alice", 100).as_str(), "alice:100");
    }

    #[test]
    fn test_progress_bounds() {
        assert!(Progress::new(100).is_some());
        assert!(Progress::new(101).is_none());
        assert_eq!("".parse::<Progress>().unwrap(), Progress::ZERO);
        assert_eq!(" 40 ".parse::<Progress>().unwrap().get(), 40);
        assert!("abc".parse::<Progress>().is_err());
        assert!("150".parse::<Progress>().is_err());
    }

    #[test]
    fn test_scrum_upsert_overwrites_in_place() {
        let mut scrum = Scrum::new(1, true);
        scrum.upsert(snapshot("a:1", 10));
        scrum.upsert(snapshot("b:2", 20));
        scrum.upsert(snapshot("a:1", 30));

        assert_eq!(scrum.snapshots.len(), 2);
        assert_eq!(scrum.snapshots[0].task_id.as_str(), "a:1");
        assert_eq!(scrum.snapshots[0].progress.get(), 30);
    }

    #[test]
    fn test_sprint_date_label() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let same_year = SprintDate::Started(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
        let other_year = SprintDate::Started(Utc.with_ymd_and_hms(2023, 11, 20, 9, 0, 0).unwrap());

        assert_eq!(same_year.label(now), "Mar 5");
        assert_eq!(other_year.label(now), "Nov 20 23");
        assert_eq!(SprintDate::Label("Week 12".into()).label(now), "Week 12");
    }

    #[test]
    fn test_best_known_progress() {
        let details = TaskDetails {
            progress: 0,
            previous: 40,
            ..Default::default()
        };
        assert_eq!(details.best_known(), 40);
        let details = TaskDetails {
            progress: 60,
            previous: 40,
            ..Default::default()
        };
        assert_eq!(details.best_known(), 60);
    }

    #[test]
    fn test_epoch_seconds_round_trip() {
        let at = from_epoch_seconds(1_500_000_000.25);
        assert_eq!(at.timestamp(), 1_500_000_000);
        assert_eq!(to_epoch_seconds(at), 1_500_000_000.25);
    }
}
