use std::cmp::Ordering;

use serde::Serialize;

use super::cursor::{SortColumn, SortOrder, ViewKey};
use super::status::StatusCell;
use crate::board::{Project, Sprint, TaskRecord};
use crate::errors::Result;

/// Limits applied to text shown in the task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub description_max: usize,
    pub developer_max: usize,
    /// Issue page base URL; rows link to `{base}/{issue}` when set.
    pub issue_url_base: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            description_max: 90,
            developer_max: 10,
            issue_url_base: None,
        }
    }
}

impl RenderOptions {
    pub fn issue_url(&self, issue: u64) -> Option<String> {
        self.issue_url_base
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), issue))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub task_id: String,
    pub developer: String,
    pub issue: u64,
    pub issue_url: Option<String>,
    pub description: String,
    pub today: bool,
    pub status: StatusCell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockerRow {
    pub developer: String,
    pub issue: u64,
    pub issue_url: Option<String>,
    pub description: String,
    pub blocker: String,
}

/// The task table and blocker list of one sprint and scrum, in final order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub sprint: u32,
    pub scrum: u32,
    pub column: SortColumn,
    pub order: SortOrder,
    pub tasks: Vec<TaskRow>,
    pub blockers: Vec<BlockerRow>,
}

impl RenderedView {
    fn empty(key: ViewKey) -> Self {
        Self {
            sprint: key.sprint,
            scrum: key.scrum,
            column: key.column,
            order: key.order,
            tasks: Vec::new(),
            blockers: Vec::new(),
        }
    }
}

/// Build the board for `key`.
///
/// A sprint left with only scrum 0 is shown as of scrum 1, which yields the
/// carried-over progress as the previous value of every task.
pub fn render_view(project: &Project, key: ViewKey, options: &RenderOptions) -> Result<RenderedView> {
    let Some(sprint) = project.sprint(key.sprint) else {
        return Ok(RenderedView::empty(key));
    };
    let target = key.scrum.max(1);

    let mut view = RenderedView::empty(key);
    for task in &sprint.tasks {
        let (row, blocker) = render_task(project, sprint, task, target, options)?;
        if let Some(blocker) = blocker {
            view.blockers.push(blocker);
        }
        view.tasks.push(row);
    }
    sort_rows(&mut view.tasks, key.column, key.order);
    Ok(view)
}

fn render_task(
    project: &Project,
    sprint: &Sprint,
    task: &TaskRecord,
    target: u32,
    options: &RenderOptions,
) -> Result<(TaskRow, Option<BlockerRow>)> {
    let details = sprint.compute_task_details(&task.id, target)?;
    let developer = truncate(&project.resolve_developer_name(&task.developer), options.developer_max);
    let issue_url = options.issue_url(task.issue);

    let blocker = (!details.blocker.is_empty()).then(|| BlockerRow {
        developer: developer.clone(),
        issue: task.issue,
        issue_url: issue_url.clone(),
        description: task.description.clone(),
        blocker: details.blocker.clone(),
    });

    let row = TaskRow {
        task_id: task.id.to_string(),
        developer,
        issue: task.issue,
        issue_url,
        description: truncate(&task.description, options.description_max),
        today: details.today,
        status: StatusCell::from_details(&details),
    };
    Ok((row, blocker))
}

/// Sort by `column`. Descending order is the exact reverse of ascending.
pub fn sort_rows(rows: &mut [TaskRow], column: SortColumn, order: SortOrder) {
    let compare: fn(&TaskRow, &TaskRow) -> Ordering = match column {
        SortColumn::Developer => |a, b| a.developer.cmp(&b.developer),
        SortColumn::Issue => |a, b| a.issue.cmp(&b.issue),
        SortColumn::Description => |a, b| a.description.cmp(&b.description),
        SortColumn::Status => |a, b| a.status.displayed.cmp(&b.status.displayed),
    };
    rows.sort_by(compare);
    if order == SortOrder::Descending {
        rows.reverse();
    }
}

/// First `max` characters of `s`.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
