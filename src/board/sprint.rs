use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::commands::TaskRef;
use super::developers::DeveloperDirectory;
use super::models::{ProgressSnapshot, Scrum, SprintDate, TaskDetails, TaskId, TaskRecord};
use crate::errors::{Result, SprintError};

/// A sprint: its task roster and its ordered scrums.
///
/// Scrum 0 always exists and only holds work carried over from the previous
/// sprint; it never becomes the active scrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprint {
    pub number: u32,
    pub started: SprintDate,
    pub active: bool,
    pub tasks: Vec<TaskRecord>,
    pub scrums: Vec<Scrum>,
    developers: Vec<String>,
}

/// A task resolved against the issue tracker, ready to join a sprint.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub developer: String,
    pub issue: u64,
    pub description: String,
}

/// Result of `Sprint::add_tasks`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddTasksOutcome {
    pub added: Vec<TaskId>,
    pub duplicates: Vec<TaskId>,
}

impl AddTasksOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

impl Sprint {
    pub fn new(
        number: u32,
        started: SprintDate,
        active: bool,
        tasks: Vec<TaskRecord>,
        scrums: Vec<Scrum>,
    ) -> Self {
        let mut sprint = Self {
            number,
            started,
            active,
            tasks,
            scrums,
            developers: Vec::new(),
        };
        sprint.refresh_developers();
        sprint
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn has_task(&self, id: &TaskId) -> bool {
        self.task(id).is_some()
    }

    /// Login ids of the developers holding tasks in this sprint, sorted.
    pub fn developers(&self) -> &[String] {
        &self.developers
    }

    fn refresh_developers(&mut self) {
        let mut devs: Vec<String> = self.tasks.iter().map(|t| t.developer.clone()).collect();
        devs.sort();
        devs.dedup();
        self.developers = devs;
    }

    pub fn scrum(&self, number: u32) -> Option<&Scrum> {
        self.scrums.iter().find(|s| s.number == number)
    }

    pub fn last_scrum(&self) -> Option<&Scrum> {
        self.scrums.last()
    }

    /// Number of the highest scrum, zero when only scrum 0 exists.
    pub fn last_scrum_number(&self) -> u32 {
        self.scrums.last().map_or(0, |s| s.number)
    }

    /// The open scrum, which can only be the highest-numbered one above scrum 0.
    pub fn active_scrum(&self) -> Option<&Scrum> {
        match self.scrums.len() {
            0 | 1 => None,
            n => Some(&self.scrums[n - 1]).filter(|s| s.active),
        }
    }

    pub fn active_scrum_mut(&mut self) -> Option<&mut Scrum> {
        match self.scrums.len() {
            0 | 1 => None,
            n => Some(&mut self.scrums[n - 1]).filter(|s| s.active),
        }
    }

    /// Close the sprint, force-closing its open scrum first.
    pub fn close(&mut self) -> Result<()> {
        if !self.active {
            return Err(SprintError::invalid_state(format!(
                "Sprint {} is not active",
                self.number
            )));
        }
        if let Some(scrum) = self.active_scrum_mut() {
            scrum.active = false;
        }
        self.active = false;
        info!(sprint = self.number, "Sprint closed");
        Ok(())
    }

    /// Close the open scrum.
    pub fn close_scrum(&mut self) -> Result<()> {
        let number = self.number;
        let scrum = self.active_scrum_mut().ok_or_else(|| {
            SprintError::invalid_state(format!("Sprint {} has no active scrum", number))
        })?;
        scrum.active = false;
        info!(sprint = number, scrum = scrum.number, "Scrum closed");
        Ok(())
    }

    /// Open the next scrum, carrying forward every task of the sprint that
    /// was blocked or worked on in the preceding scrum.
    pub fn open_new_scrum(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(SprintError::invalid_state(format!(
                "Sprint {} is not active",
                self.number
            )));
        }
        if self.active_scrum().is_some() {
            return Err(SprintError::invalid_state(format!(
                "Sprint {} already has an active scrum",
                self.number
            )));
        }

        let mut scrum = Scrum::new(self.scrums.len() as u32, true);
        if let Some(last) = self.scrums.last() {
            for task in &self.tasks {
                if let Some(prev) = last.snapshot(&task.id).filter(|s| s.is_outstanding()) {
                    scrum.snapshots.push(ProgressSnapshot {
                        submitted_at: now,
                        ..prev.clone()
                    });
                }
            }
        }

        info!(
            sprint = self.number,
            scrum = scrum.number,
            carried = scrum.snapshots.len(),
            "Scrum opened"
        );
        self.scrums.push(scrum);
        Ok(())
    }

    /// Add resolved tasks. Entries whose task id already exists are rejected.
    pub fn add_tasks(
        &mut self,
        tasks: impl IntoIterator<Item = NewTask>,
        now: DateTime<Utc>,
    ) -> Result<AddTasksOutcome> {
        if !self.active {
            return Err(SprintError::invalid_state(format!(
                "Cannot add tasks to closed sprint {}",
                self.number
            )));
        }

        let mut outcome = AddTasksOutcome::default();
        for new in tasks {
            let record = TaskRecord::new(&new.developer, new.issue, &new.description, now);
            if self.has_task(&record.id) {
                warn!(task = %record.id, "Task already exists");
                outcome.duplicates.push(record.id);
                continue;
            }
            info!(sprint = self.number, task = %record.id, "Task added");
            outcome.added.push(record.id.clone());
            self.tasks.push(record);
        }
        self.refresh_developers();
        Ok(outcome)
    }

    /// Delete the tasks a reference points at.
    ///
    /// A bare issue number deletes every task on that issue; `dev:issue`
    /// deletes the one task of that developer. Snapshots stay behind so a
    /// re-added task gets its history back.
    pub fn delete_task(&mut self, target: &TaskRef, directory: &DeveloperDirectory) -> bool {
        let before = self.tasks.len();
        match target {
            TaskRef::Issue(issue) => self.tasks.retain(|t| t.issue != *issue),
            TaskRef::Assigned { developer, issue } => {
                let id = TaskId::new(&directory.resolve_id(developer), *issue);
                self.tasks.retain(|t| t.id != id);
            }
        }
        let removed = before - self.tasks.len();
        if removed > 0 {
            info!(sprint = self.number, ?target, removed, "Tasks deleted");
            self.refresh_developers();
        }
        removed > 0
    }

    /// Delete a scrum by number and renumber the rest from 0. Scrum 0 stays.
    pub fn delete_scrum(&mut self, number: u32) -> bool {
        if number == 0 {
            warn!(sprint = self.number, "Scrum 0 holds carried-over work and cannot be deleted");
            return false;
        }
        let before = self.scrums.len();
        self.scrums.retain(|s| s.number != number);
        if self.scrums.len() == before {
            return false;
        }
        for (i, scrum) in self.scrums.iter_mut().enumerate() {
            scrum.number = i as u32;
        }
        info!(sprint = self.number, scrum = number, "Scrum deleted");
        true
    }

    /// Reopen the last scrum when none is open. Scrum 0 is never reopened.
    pub fn reopen_last_scrum(&mut self) -> bool {
        if !self.active || self.active_scrum().is_some() || self.scrums.len() < 2 {
            return false;
        }
        if let Some(scrum) = self.scrums.last_mut() {
            scrum.active = true;
            info!(sprint = self.number, scrum = scrum.number, "Scrum reopened");
        }
        true
    }

    /// Progress, previous progress, blocker and today flag of a task as of
    /// `target` scrum.
    ///
    /// Scrums are walked in order up to and including the target. The
    /// target's own snapshot supplies current values; the last snapshot seen
    /// in an earlier scrum supplies the previous progress.
    pub fn compute_task_details(&self, task_id: &TaskId, target: u32) -> Result<TaskDetails> {
        if target == 0 {
            return Err(SprintError::InvalidScrumNumber(target));
        }

        let mut details = TaskDetails::default();
        for scrum in &self.scrums {
            if let Some(snap) = scrum.snapshot(task_id) {
                if scrum.number == target {
                    details.progress = snap.progress.get();
                    details.blocker = snap.blocker.clone();
                    details.today = snap.today;
                } else {
                    details.previous = snap.progress.get();
                }
            }
            if scrum.number == target {
                break;
            }
        }
        Ok(details)
    }

    /// Details as of the last scrum, or as of scrum 1 when the sprint only
    /// has its carry-over scrum.
    pub fn final_task_details(&self, task_id: &TaskId) -> Result<TaskDetails> {
        self.compute_task_details(task_id, self.last_scrum_number().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::Progress;

    fn snap(id: &str, progress: u32, blocker: &str, today: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            task_id: TaskId::from(id),
            progress: Progress::new(progress).unwrap(),
            blocker: blocker.to_string(),
            today,
            submitted_at: Utc::now(),
        }
    }

    fn new_task(dev: &str, issue: u64) -> NewTask {
        NewTask {
            developer: dev.to_string(),
            issue,
            description: format!("Issue {}", issue),
        }
    }

    /// Active sprint with tasks alice:1 and bob:2 and scrums 0..=2, scrum 2 open.
    fn sample_sprint() -> Sprint {
        let now = Utc::now();
        let tasks = vec![
            TaskRecord::new("alice", 1, "Parser", now),
            TaskRecord::new("bob", 2, "Renderer", now),
        ];
        let mut s0 = Scrum::new(0, false);
        s0.upsert(snap("alice:1", 10, "", false));
        let mut s1 = Scrum::new(1, false);
        s1.upsert(snap("alice:1", 30, "", true));
        s1.upsert(snap("bob:2", 20, "needs API key", false));
        let mut s2 = Scrum::new(2, true);
        s2.upsert(snap("alice:1", 50, "", false));
        Sprint::new(1, SprintDate::Started(now), true, tasks, vec![s0, s1, s2])
    }

    // =========================================
    // Task details
    // =========================================

    #[test]
    fn test_compute_task_details_target_and_previous() {
        let sprint = sample_sprint();
        let d = sprint.compute_task_details(&"alice:1".into(), 2).unwrap();
        assert_eq!(d.progress, 50);
        assert_eq!(d.previous, 30);
        assert_eq!(d.blocker, "");
        assert!(!d.today);

        let d = sprint.compute_task_details(&"alice:1".into(), 1).unwrap();
        assert_eq!(d.progress, 30);
        assert_eq!(d.previous, 10);
        assert!(d.today);
    }

    #[test]
    fn test_compute_task_details_without_snapshot_in_target() {
        let sprint = sample_sprint();
        let d = sprint.compute_task_details(&"bob:2".into(), 2).unwrap();
        assert_eq!(d.progress, 0);
        assert_eq!(d.previous, 20);
        assert_eq!(d.blocker, "");
    }

    #[test]
    fn test_compute_task_details_unknown_task_defaults() {
        let sprint = sample_sprint();
        let d = sprint.compute_task_details(&"carol:9".into(), 2).unwrap();
        assert_eq!(d, TaskDetails::default());
    }

    #[test]
    fn test_compute_task_details_rejects_scrum_zero() {
        let sprint = sample_sprint();
        assert!(matches!(
            sprint.compute_task_details(&"alice:1".into(), 0),
            Err(SprintError::InvalidScrumNumber(0))
        ));
    }

    #[test]
    fn test_compute_task_details_is_idempotent() {
        let sprint = sample_sprint();
        let first = sprint.compute_task_details(&"bob:2".into(), 1).unwrap();
        let second = sprint.compute_task_details(&"bob:2".into(), 1).unwrap();
        assert_eq!(first, second);
    }

    // =========================================
    // Scrum lifecycle
    // =========================================

    #[test]
    fn test_open_new_scrum_requires_closed_scrum() {
        let mut sprint = sample_sprint();
        let err = sprint.open_new_scrum(Utc::now()).unwrap_err();
        assert!(matches!(err, SprintError::InvalidState(_)));
    }

    #[test]
    fn test_open_new_scrum_carries_blockers_and_today() {
        let mut sprint = sample_sprint();
        // Scrum 2 holds alice at 50 with nothing outstanding; make it carry.
        sprint.scrums[2].upsert(snap("alice:1", 50, "", true));
        sprint.close_scrum().unwrap();
        sprint.open_new_scrum(Utc::now()).unwrap();

        let scrum = sprint.active_scrum().unwrap();
        assert_eq!(scrum.number, 3);
        assert_eq!(scrum.snapshots.len(), 1);
        assert_eq!(scrum.snapshots[0].task_id.as_str(), "alice:1");
        assert_eq!(scrum.snapshots[0].progress.get(), 50);
        assert!(scrum.snapshots[0].today);
    }

    #[test]
    fn test_open_new_scrum_skips_orphaned_snapshots() {
        let mut sprint = sample_sprint();
        sprint.scrums[2].upsert(snap("ghost:7", 5, "gone", false));
        sprint.close_scrum().unwrap();
        sprint.open_new_scrum(Utc::now()).unwrap();
        assert!(sprint.active_scrum().unwrap().snapshots.is_empty());
    }

    #[test]
    fn test_close_sprint_closes_scrum() {
        let mut sprint = sample_sprint();
        sprint.close().unwrap();
        assert!(!sprint.active);
        assert!(sprint.active_scrum().is_none());
        assert!(!sprint.scrums[2].active);
        assert!(sprint.close().is_err());
    }

    #[test]
    fn test_close_scrum_without_active_scrum_fails() {
        let mut sprint = sample_sprint();
        sprint.close_scrum().unwrap();
        assert!(matches!(
            sprint.close_scrum(),
            Err(SprintError::InvalidState(_))
        ));
    }

    // =========================================
    // Task registry
    // =========================================

    #[test]
    fn test_add_tasks_rejects_duplicates() {
        let mut sprint = sample_sprint();
        let outcome = sprint
            .add_tasks(vec![new_task("bob", 55), new_task("bob", 55)], Utc::now())
            .unwrap();
        assert_eq!(outcome.added, vec![TaskId::from("bob:55")]);
        assert_eq!(outcome.duplicates, vec![TaskId::from("bob:55")]);

        let outcome = sprint.add_tasks(vec![new_task("bob", 55)], Utc::now()).unwrap();
        assert!(!outcome.changed());
    }

    #[test]
    fn test_add_tasks_shared_issue_distinct_developers() {
        let mut sprint = sample_sprint();
        sprint
            .add_tasks(vec![new_task("bob", 9), new_task("carol", 9)], Utc::now())
            .unwrap();
        assert!(sprint.has_task(&"bob:9".into()));
        assert!(sprint.has_task(&"carol:9".into()));
        assert_eq!(sprint.developers(), ["alice", "bob", "carol"]);
    }

    #[test]
    fn test_add_tasks_to_closed_sprint_fails() {
        let mut sprint = sample_sprint();
        sprint.close().unwrap();
        assert!(sprint.add_tasks(vec![new_task("bob", 3)], Utc::now()).is_err());
    }

    #[test]
    fn test_delete_task_by_issue_removes_all_assignees() {
        let mut sprint = sample_sprint();
        sprint
            .add_tasks(vec![new_task("carol", 2)], Utc::now())
            .unwrap();
        let dir = DeveloperDirectory::default();
        assert!(sprint.delete_task(&TaskRef::Issue(2), &dir));
        assert_eq!(sprint.tasks.len(), 1);
        assert_eq!(sprint.developers(), ["alice"]);
        assert!(!sprint.delete_task(&TaskRef::Issue(2), &dir));
    }

    #[test]
    fn test_delete_task_by_developer_name_keeps_history() {
        let mut sprint = sample_sprint();
        let dir = DeveloperDirectory::new([("alice", "ally")]);
        let target = TaskRef::Assigned {
            developer: "Ally".into(),
            issue: 1,
        };
        assert!(sprint.delete_task(&target, &dir));
        assert!(!sprint.has_task(&"alice:1".into()));
        assert!(sprint.scrums[2].snapshot(&"alice:1".into()).is_some());

        sprint
            .add_tasks(vec![new_task("alice", 1)], Utc::now())
            .unwrap();
        let d = sprint.compute_task_details(&"alice:1".into(), 2).unwrap();
        assert_eq!(d.progress, 50);
    }

    #[test]
    fn test_delete_scrum_renumbers() {
        let mut sprint = sample_sprint();
        assert!(sprint.delete_scrum(1));
        let numbers: Vec<u32> = sprint.scrums.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![0, 1]);
        assert!(!sprint.delete_scrum(7));
        assert!(!sprint.delete_scrum(0));
    }

    #[test]
    fn test_reopen_last_scrum() {
        let mut sprint = sample_sprint();
        assert!(!sprint.reopen_last_scrum());
        sprint.close_scrum().unwrap();
        assert!(sprint.reopen_last_scrum());
        assert_eq!(sprint.active_scrum().map(|s| s.number), Some(2));
    }
}
