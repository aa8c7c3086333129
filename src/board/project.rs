use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::carry;
use super::commands::{AdminCommand, TaskUpdate, parse_admin_line};
use super::developers::DeveloperDirectory;
use super::models::{ProgressSnapshot, Scrum, TaskId};
use super::sprint::{AddTasksOutcome, NewTask, Sprint};
use crate::errors::{Result, SprintError};

/// The root aggregate: every sprint of the project.
///
/// The active sprint and scrum are not stored separately. Only the last
/// sprint may be open, and only its last scrum above scrum 0, so both are
/// read off the flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub sprints: Vec<Sprint>,
    directory: DeveloperDirectory,
}

/// One row of a developer's update form.
#[derive(Debug, Clone, PartialEq)]
pub struct DevTask {
    pub task_id: TaskId,
    pub issue: u64,
    pub description: String,
    pub progress: u8,
    pub today: bool,
    pub blocker: String,
}

impl Project {
    pub fn new(name: impl Into<String>, directory: DeveloperDirectory) -> Self {
        Self {
            name: name.into(),
            sprints: Vec::new(),
            directory,
        }
    }

    pub(crate) fn from_parts(name: String, sprints: Vec<Sprint>, directory: DeveloperDirectory) -> Self {
        Self {
            name,
            sprints,
            directory,
        }
    }

    pub fn directory(&self) -> &DeveloperDirectory {
        &self.directory
    }

    pub fn sprint(&self, number: u32) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.number == number)
    }

    pub fn active_sprint(&self) -> Option<&Sprint> {
        self.sprints.last().filter(|s| s.active)
    }

    pub fn active_sprint_mut(&mut self) -> Option<&mut Sprint> {
        self.sprints.last_mut().filter(|s| s.active)
    }

    pub fn active_scrum(&self) -> Option<&Scrum> {
        self.active_sprint().and_then(Sprint::active_scrum)
    }

    pub fn is_sprint_active(&self) -> bool {
        self.active_sprint().is_some()
    }

    pub fn is_scrum_active(&self) -> bool {
        self.active_scrum().is_some()
    }

    fn require_active_sprint(&mut self) -> Result<&mut Sprint> {
        self.active_sprint_mut()
            .ok_or_else(|| SprintError::invalid_state("No sprint is active"))
    }

    pub fn resolve_developer_id(&self, name: &str) -> String {
        self.directory.resolve_id(name)
    }

    pub fn resolve_developer_name(&self, id: &str) -> String {
        self.directory.display_name(id)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    /// Start the next sprint, carrying forward the unfinished work of the
    /// last one.
    pub fn open_new_sprint(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(active) = self.active_sprint() {
            return Err(SprintError::invalid_state(format!(
                "Sprint {} is still active",
                active.number
            )));
        }
        let number = self.sprints.len() as u32 + 1;
        let sprint = carry::seed_sprint(self.sprints.last(), number, now)?;
        info!(sprint = number, tasks = sprint.tasks.len(), "Sprint opened");
        self.sprints.push(sprint);
        Ok(())
    }

    pub fn close_sprint(&mut self) -> Result<()> {
        self.require_active_sprint()?.close()
    }

    pub fn open_new_scrum(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.require_active_sprint()?.open_new_scrum(now)
    }

    pub fn close_scrum(&mut self) -> Result<()> {
        self.require_active_sprint()?.close_scrum()
    }

    // ── Scrum updates ─────────────────────────────────────────────────

    /// Record developer updates in the active scrum.
    ///
    /// A snapshot is written only when progress, blocker or today differ
    /// from what the task currently shows. With no snapshot in this scrum
    /// yet, the task currently shows its previous progress, no blocker and
    /// not today. Returns whether anything changed.
    pub fn apply_scrum_update(&mut self, updates: &[TaskUpdate], now: DateTime<Utc>) -> Result<bool> {
        let sprint = self
            .active_sprint_mut()
            .filter(|s| s.active_scrum().is_some())
            .ok_or_else(|| SprintError::invalid_state("No scrum is active"))?;
        let scrum_number = sprint.last_scrum_number();

        let mut pending = Vec::new();
        for update in updates {
            if !sprint.has_task(&update.task_id) {
                warn!(task = %update.task_id, "Ignoring update for unknown task");
                continue;
            }
            let details = sprint.compute_task_details(&update.task_id, scrum_number)?;
            let reported = sprint
                .scrum(scrum_number)
                .is_some_and(|s| s.snapshot(&update.task_id).is_some());
            let shown = if reported { details.progress } else { details.previous };

            if update.progress.get() != shown
                || update.blocker != details.blocker
                || update.today != details.today
            {
                pending.push(ProgressSnapshot {
                    task_id: update.task_id.clone(),
                    progress: update.progress,
                    blocker: update.blocker.clone(),
                    today: update.today,
                    submitted_at: now,
                });
            }
        }

        let changed = !pending.is_empty();
        if let Some(scrum) = sprint.active_scrum_mut() {
            for snapshot in pending {
                info!(scrum = scrum.number, task = %snapshot.task_id, progress = %snapshot.progress, "Scrum update");
                scrum.upsert(snapshot);
            }
        }
        Ok(changed)
    }

    /// Tasks of one developer in the active scrum, progress falling back to
    /// the previous report.
    pub fn dev_tasks(&self, name: &str) -> Result<Vec<DevTask>> {
        let sprint = self
            .active_sprint()
            .filter(|s| s.active_scrum().is_some())
            .ok_or_else(|| SprintError::invalid_state("No scrum is active"))?;
        let dev = self.resolve_developer_id(name);
        let scrum_number = sprint.last_scrum_number();

        sprint
            .tasks
            .iter()
            .filter(|t| t.developer == dev)
            .map(|t| {
                let d = sprint.compute_task_details(&t.id, scrum_number)?;
                Ok(DevTask {
                    task_id: t.id.clone(),
                    issue: t.issue,
                    description: t.description.clone(),
                    progress: d.best_known(),
                    today: d.today,
                    blocker: d.blocker,
                })
            })
            .collect()
    }

    // ── Task registry ─────────────────────────────────────────────────

    /// Add tasks to the active sprint. `developer` must already be a login id.
    pub fn add_tasks(&mut self, tasks: Vec<NewTask>, now: DateTime<Utc>) -> Result<AddTasksOutcome> {
        self.require_active_sprint()?.add_tasks(tasks, now)
    }

    // ── Administration ────────────────────────────────────────────────

    /// Run a `;`-separated admin line. Malformed fragments and commands
    /// that do not apply in the current state are skipped. Returns whether
    /// anything changed.
    pub fn run_admin_command(&mut self, line: &str) -> bool {
        let mut changed = false;
        for command in parse_admin_line(line) {
            info!(?command, "Running admin command");
            let applied = self.apply_admin(&command);
            if !applied {
                warn!(?command, "Admin command had no effect");
            }
            changed |= applied;
        }
        changed
    }

    fn apply_admin(&mut self, command: &AdminCommand) -> bool {
        match command {
            AdminCommand::DeleteTask(target) => match self.sprints.last_mut() {
                Some(sprint) if sprint.active => sprint.delete_task(target, &self.directory),
                _ => false,
            },
            AdminCommand::DeleteScrum(number) => self
                .active_sprint_mut()
                .is_some_and(|s| s.delete_scrum(*number)),
            AdminCommand::DeleteSprint(number) => self.delete_sprint(*number),
            AdminCommand::ReopenScrum => self
                .active_sprint_mut()
                .is_some_and(Sprint::reopen_last_scrum),
            AdminCommand::ReopenSprint => self.reopen_last_sprint(),
        }
    }

    /// Delete a sprint by number and renumber the rest from 1.
    fn delete_sprint(&mut self, number: u32) -> bool {
        let before = self.sprints.len();
        self.sprints.retain(|s| s.number != number);
        if self.sprints.len() == before {
            return false;
        }
        for (i, sprint) in self.sprints.iter_mut().enumerate() {
            sprint.number = i as u32 + 1;
        }
        // Only the last sprint may stay open.
        let count = self.sprints.len();
        for sprint in self.sprints.iter_mut().take(count.saturating_sub(1)) {
            sprint.active = false;
        }
        info!(sprint = number, "Sprint deleted");
        true
    }

    fn reopen_last_sprint(&mut self) -> bool {
        if self.is_sprint_active() {
            return false;
        }
        match self.sprints.last_mut() {
            Some(sprint) => {
                sprint.active = true;
                info!(sprint = sprint.number, "Sprint reopened");
                true
            }
            None => false,
        }
    }
}
