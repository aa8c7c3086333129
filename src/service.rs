//! `SprintBoard`: the project, its view, and the stores behind them.
//!
//! Every mutation follows the same path: apply to the in-memory project,
//! save the whole document, then reset the view. When the save fails the
//! project is rolled back to what is persisted and the error is returned
//! as fatal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::board::{
    AddTasksOutcome, DevTask, DeveloperDirectory, NewTask, Project, ProjectDocument, TaskRef,
    commands::{parse_task_list, parse_update_fields},
};
use crate::errors::{Result, SprintError};
use crate::repo::ProjectRepository;
use crate::tracker::IssueTracker;
use crate::view::{BoardHeader, RenderedView, SortColumn, View, ViewSettings};

/// Whether a mutation left the project different from before.
trait Outcome {
    fn changed(&self) -> bool;
}

impl Outcome for () {
    fn changed(&self) -> bool {
        true
    }
}

impl Outcome for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl Outcome for AddTasksOutcome {
    fn changed(&self) -> bool {
        AddTasksOutcome::changed(self)
    }
}

pub struct SprintBoard {
    repo: Arc<dyn ProjectRepository>,
    tracker: Arc<dyn IssueTracker>,
    directory: DeveloperDirectory,
    project: Project,
    view: View,
}

impl std::fmt::Debug for SprintBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprintBoard")
            .field("origin", &self.repo.origin())
            .field("project", &self.project.name)
            .field("cursor", self.view.cursor())
            .finish()
    }
}

impl SprintBoard {
    /// Load the project document and build the board over it.
    pub async fn load(
        repo: Arc<dyn ProjectRepository>,
        tracker: Arc<dyn IssueTracker>,
        directory: DeveloperDirectory,
        settings: ViewSettings,
    ) -> Result<Self> {
        let doc = repo.load().await?;
        let project = Project::from_document(doc, directory.clone())?;
        info!(
            origin = %repo.origin(),
            project = %project.name,
            sprints = project.sprints.len(),
            "Project loaded"
        );
        let view = View::new(&project, settings);
        Ok(Self {
            repo,
            tracker,
            directory,
            project,
            view,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn origin(&self) -> String {
        self.repo.origin()
    }

    pub fn document(&self) -> ProjectDocument {
        self.project.to_document(Some(&self.repo.origin()))
    }

    /// Re-read the document from the store. The sort state survives.
    pub async fn reload(&mut self) -> Result<()> {
        let doc = self.repo.load().await?;
        self.project = Project::from_document(doc, self.directory.clone())?;
        self.view.reset(&self.project);
        info!(origin = %self.repo.origin(), "Project reloaded");
        Ok(())
    }

    async fn commit<T, F>(&mut self, op: F) -> Result<T>
    where
        T: Outcome,
        F: FnOnce(&mut Project) -> Result<T>,
    {
        let before = self.project.clone();
        let outcome = match op(&mut self.project) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.project = before;
                return Err(e);
            }
        };
        if !outcome.changed() {
            return Ok(outcome);
        }

        let doc = self.project.to_document(Some(&self.repo.origin()));
        if let Err(e) = self.repo.save(&doc).await {
            error!(error = %e, "Save failed, rolling back");
            self.project = before;
            self.view.reset(&self.project);
            return Err(e.into());
        }
        self.view.reset(&self.project);
        Ok(outcome)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    pub async fn open_new_sprint(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.commit(|p| p.open_new_sprint(now)).await
    }

    pub async fn close_sprint(&mut self) -> Result<()> {
        self.commit(|p| p.close_sprint()).await
    }

    pub async fn open_new_scrum(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.commit(|p| p.open_new_scrum(now)).await
    }

    pub async fn close_scrum(&mut self) -> Result<()> {
        self.commit(|p| p.close_scrum()).await
    }

    // ── Updates ───────────────────────────────────────────────────────

    /// Apply a submitted update form. Returns whether anything changed.
    pub async fn apply_update<'a, I>(&mut self, fields: I, now: DateTime<Utc>) -> Result<bool>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let updates = parse_update_fields(fields);
        self.commit(|p| p.apply_scrum_update(&updates, now)).await
    }

    /// Add the tasks of a `issue,dev:issue,...` list to the active sprint.
    ///
    /// Bare issue numbers take their developer from the tracker. Issues
    /// that are missing or unowned are skipped; an unreachable tracker
    /// aborts the whole request before anything is added.
    pub async fn add_tasks(&mut self, spec: &str, now: DateTime<Utc>) -> Result<AddTasksOutcome> {
        if !self.project.is_sprint_active() {
            return Err(SprintError::invalid_state("No sprint is active"));
        }

        let mut tasks = Vec::new();
        for entry in parse_task_list(spec) {
            match self.resolve_task(&entry).await {
                Ok(task) => tasks.push(task),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(issue = entry.issue(), error = %e, "Skipping task"),
            }
        }
        if tasks.is_empty() {
            return Ok(AddTasksOutcome::default());
        }
        self.commit(|p| p.add_tasks(tasks, now)).await
    }

    async fn resolve_task(&self, entry: &TaskRef) -> Result<NewTask> {
        let issue = self.tracker.fetch_issue(entry.issue()).await?;
        let developer = match entry {
            TaskRef::Assigned { developer, .. } => self.project.resolve_developer_id(developer),
            // Tracker logins are already ids.
            TaskRef::Issue(_) => issue.developer()?.to_string(),
        };
        Ok(NewTask {
            developer,
            issue: issue.iid,
            description: issue.title,
        })
    }

    /// Run an admin line. Returns whether anything changed.
    pub async fn run_admin(&mut self, line: &str) -> Result<bool> {
        self.commit(|p| Ok(p.run_admin_command(line))).await
    }

    // ── Reading ───────────────────────────────────────────────────────

    pub fn rendered(&self) -> Result<Arc<RenderedView>> {
        self.view.rendered(&self.project)
    }

    pub fn header(&self, now: DateTime<Utc>) -> Result<BoardHeader> {
        let blockers = self.rendered()?.blockers.len();
        Ok(self.view.header(&self.project, blockers, now))
    }

    pub fn dev_tasks(&self, name: &str) -> Result<Vec<DevTask>> {
        self.project.dev_tasks(name)
    }

    // ── Navigation ────────────────────────────────────────────────────

    pub fn prev_scrum(&mut self) {
        self.view.cursor_mut().prev_scrum(&self.project);
    }

    pub fn next_scrum(&mut self) {
        self.view.cursor_mut().next_scrum(&self.project);
    }

    pub fn prev_sprint(&mut self) {
        self.view.cursor_mut().prev_sprint(&self.project);
    }

    pub fn next_sprint(&mut self) {
        self.view.cursor_mut().next_sprint(&self.project);
    }

    pub fn last(&mut self) {
        self.view.cursor_mut().set_last(&self.project);
    }

    /// Point the view at `sprint`, optionally at one of its scrums.
    pub fn select(&mut self, sprint: u32, scrum: Option<u32>) -> bool {
        self.view.cursor_mut().select(&self.project, sprint, scrum)
    }

    pub fn sort(&mut self, column: SortColumn) {
        self.view.cursor_mut().set_sort_column(column);
    }
}
