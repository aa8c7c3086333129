//! What the board shows: cursor, rendering and the rendered-view cache.

pub mod cache;
pub mod cursor;
pub mod render;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::Project;
use crate::errors::Result;

pub use cache::ViewCache;
pub use cursor::{SortColumn, SortOrder, ViewCursor, ViewKey};
pub use render::{BlockerRow, RenderOptions, RenderedView, TaskRow, render_view};
pub use status::{StatusCell, StatusKind};

const MIN_TOP_HEIGHT: f32 = 22.0;
const MIN_BLOCKER_HEIGHT: u32 = 8;
const MAX_BLOCKER_HEIGHT: u32 = 18;
const BLOCKER_ROW_HEIGHT: u32 = 2;

/// Height in percent of the blocker panel for `blockers` entries.
pub fn blocker_panel_height(blockers: usize) -> u32 {
    let rows = u32::try_from(blockers).unwrap_or(u32::MAX);
    MIN_BLOCKER_HEIGHT
        .saturating_add(BLOCKER_ROW_HEIGHT.saturating_mul(rows))
        .min(MAX_BLOCKER_HEIGHT)
}

/// Summary shown above the task table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardHeader {
    pub project: String,
    pub num_sprints: u32,
    /// Scrums of the shown sprint, not counting scrum 0.
    pub num_scrums: u32,
    pub num_tasks: usize,
    pub sprint: u32,
    pub scrum: u32,
    pub sprint_date: String,
    pub sprint_active: bool,
    pub scrum_active: bool,
    /// Display names of developers who may submit updates. Empty unless a
    /// scrum is open.
    pub developers: Vec<String>,
    pub blocker_height: u32,
    pub middle_height: f32,
}

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub ttl: Duration,
    pub default_column: SortColumn,
    pub options: RenderOptions,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            ttl: cache::DEFAULT_TTL,
            default_column: SortColumn::Developer,
            options: RenderOptions::default(),
        }
    }
}

/// The cursor over a project plus the cache of what it has rendered.
#[derive(Debug)]
pub struct View {
    cursor: ViewCursor,
    cache: ViewCache,
    options: RenderOptions,
}

impl View {
    pub fn new(project: &Project, settings: ViewSettings) -> Self {
        Self {
            cursor: ViewCursor::new(project, settings.default_column),
            cache: ViewCache::new(settings.ttl),
            options: settings.options,
        }
    }

    pub fn cursor(&self) -> &ViewCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ViewCursor {
        &mut self.cursor
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The board under the cursor, from the cache when present.
    pub fn rendered(&self, project: &Project) -> Result<Arc<RenderedView>> {
        let key = self.cursor.key();
        self.cache
            .get_or_render(key, || render_view(project, key, &self.options))
    }

    /// Drop every cached board and move the cursor to the latest scrum.
    /// Called after any change to the project.
    pub fn reset(&mut self, project: &Project) {
        self.cache.invalidate_all();
        self.cursor.set_last(project);
    }

    pub fn header(&self, project: &Project, blockers: usize, now: DateTime<Utc>) -> BoardHeader {
        let sprint = project.sprint(self.cursor.sprint());
        let developers = match project.active_sprint() {
            Some(active) if project.is_scrum_active() => active
                .developers()
                .iter()
                .map(|id| project.resolve_developer_name(id))
                .collect(),
            _ => Vec::new(),
        };
        let blocker_height = blocker_panel_height(blockers);

        BoardHeader {
            project: project.name.clone(),
            num_sprints: project.sprints.len() as u32,
            num_scrums: sprint.map_or(0, |s| (s.scrums.len() as u32).saturating_sub(1)),
            num_tasks: sprint.map_or(0, |s| s.tasks.len()),
            sprint: self.cursor.sprint(),
            scrum: self.cursor.scrum(),
            sprint_date: sprint.map(|s| s.started.label(now)).unwrap_or_default(),
            sprint_active: project.is_sprint_active(),
            scrum_active: project.is_scrum_active(),
            developers,
            blocker_height,
            middle_height: 100.5 - MIN_TOP_HEIGHT - blocker_height as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::commands::TaskUpdate;
    use crate::board::{DeveloperDirectory, NewTask, Progress, TaskId};

    fn project() -> Project {
        let mut project = Project::new("demo", DeveloperDirectory::new([("jd", "john")]));
        project.open_new_sprint(Utc::now()).unwrap();
        project
            .add_tasks(
                vec![NewTask {
                    developer: "jd".into(),
                    issue: 4,
                    description: "Importer".into(),
                }],
                Utc::now(),
            )
            .unwrap();
        project
    }

    fn progress(project: &mut Project, value: u32) {
        project
            .apply_scrum_update(
                &[TaskUpdate {
                    task_id: TaskId::from("jd:4"),
                    progress: Progress::new(value).unwrap(),
                    blocker: String::new(),
                    today: false,
                }],
                Utc::now(),
            )
            .unwrap();
    }

    #[test]
    fn test_blocker_panel_height() {
        assert_eq!(blocker_panel_height(0), 8);
        assert_eq!(blocker_panel_height(2), 12);
        assert_eq!(blocker_panel_height(5), 18);
        assert_eq!(blocker_panel_height(50), 18);
    }

    #[test]
    fn test_rendered_is_stable_without_mutation() {
        let p = project();
        let view = View::new(&p, ViewSettings::default());
        let first = view.rendered(&p).unwrap();
        let second = view.rendered(&p).unwrap();
        assert_eq!(first.tasks, second.tasks);
    }

    #[test]
    fn test_reset_reflects_mutation_immediately() {
        let mut p = project();
        let mut view = View::new(&p, ViewSettings::default());
        assert_eq!(view.rendered(&p).unwrap().tasks[0].status.displayed, 0);

        progress(&mut p, 50);
        view.reset(&p);
        assert_eq!(view.rendered(&p).unwrap().tasks[0].status.displayed, 50);
    }

    #[test]
    fn test_header() {
        let p = project();
        let view = View::new(&p, ViewSettings::default());
        let header = view.header(&p, 1, Utc::now());
        assert_eq!(header.num_sprints, 1);
        assert_eq!(header.num_scrums, 1);
        assert_eq!(header.num_tasks, 1);
        assert_eq!((header.sprint, header.scrum), (1, 1));
        assert!(header.sprint_active && header.scrum_active);
        assert_eq!(header.developers, vec!["John".to_string()]);
        assert_eq!(header.blocker_height, 10);
    }

    #[test]
    fn test_header_hides_roster_without_open_scrum() {
        let mut p = project();
        p.close_scrum().unwrap();
        let view = View::new(&p, ViewSettings::default());
        assert!(view.header(&p, 0, Utc::now()).developers.is_empty());
    }
}
