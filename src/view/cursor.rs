use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Project;

/// Column the task table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Developer,
    Issue,
    Description,
    Status,
}

impl SortColumn {
    /// Name used in `/sort/{column}` routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Developer => "dev_sort",
            SortColumn::Issue => "issue_sort",
            SortColumn::Description => "desc_sort",
            SortColumn::Status => "status_sort",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev_sort" | "developer" | "dev" => Ok(SortColumn::Developer),
            "issue_sort" | "issue" => Ok(SortColumn::Issue),
            "desc_sort" | "description" | "desc" => Ok(SortColumn::Description),
            "status_sort" | "status" => Ok(SortColumn::Status),
            other => Err(format!("Unknown sort column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Identity of one rendered board: what is shown and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub sprint: u32,
    pub scrum: u32,
    pub column: SortColumn,
    pub order: SortOrder,
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.sprint,
            self.scrum,
            self.column,
            self.order.as_str()
        )
    }
}

/// Which sprint and scrum the board shows and how it is sorted.
///
/// Sprints are numbered from 1 and scrums from 0; scrum 0 only holds
/// carried-over work, so navigation cycles through scrums 1..=N. A cursor
/// over an empty project sits at sprint 0, scrum 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCursor {
    sprint: u32,
    scrum: u32,
    column: SortColumn,
    order: SortOrder,
}

impl ViewCursor {
    /// A cursor on the latest sprint and scrum.
    pub fn new(project: &Project, column: SortColumn) -> Self {
        let mut cursor = Self {
            sprint: 0,
            scrum: 0,
            column,
            order: SortOrder::Ascending,
        };
        cursor.set_last(project);
        cursor
    }

    pub fn sprint(&self) -> u32 {
        self.sprint
    }

    pub fn scrum(&self) -> u32 {
        self.scrum
    }

    pub fn column(&self) -> SortColumn {
        self.column
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn key(&self) -> ViewKey {
        ViewKey {
            sprint: self.sprint,
            scrum: self.scrum,
            column: self.column,
            order: self.order,
        }
    }

    /// Move to the most recent sprint and its most recent scrum. Sort state
    /// is kept.
    pub fn set_last(&mut self, project: &Project) {
        self.sprint = project.sprints.len() as u32;
        self.scrum = scrum_count(project, self.sprint);
    }

    pub fn next_sprint(&mut self, project: &Project) {
        self.step_sprint(project, 1);
    }

    pub fn prev_sprint(&mut self, project: &Project) {
        self.step_sprint(project, -1);
    }

    /// Step through sprints 1..=N with wrap-around, landing on the last scrum.
    fn step_sprint(&mut self, project: &Project, delta: i64) {
        let count = project.sprints.len() as u32;
        if count == 0 {
            return;
        }
        self.sprint = wrap(self.sprint, delta, count);
        self.scrum = scrum_count(project, self.sprint);
    }

    pub fn next_scrum(&mut self, project: &Project) {
        self.step_scrum(project, 1);
    }

    pub fn prev_scrum(&mut self, project: &Project) {
        self.step_scrum(project, -1);
    }

    fn step_scrum(&mut self, project: &Project, delta: i64) {
        let count = scrum_count(project, self.sprint);
        if count == 0 {
            return;
        }
        self.scrum = wrap(self.scrum, delta, count);
    }

    /// Jump to `sprint`, at `scrum` or its last scrum. Numbers out of range
    /// leave the cursor in place and return false.
    pub fn select(&mut self, project: &Project, sprint: u32, scrum: Option<u32>) -> bool {
        if project.sprint(sprint).is_none() {
            return false;
        }
        let count = scrum_count(project, sprint);
        let scrum = scrum.unwrap_or(count);
        if scrum > count || (scrum == 0 && count > 0) {
            return false;
        }
        self.sprint = sprint;
        self.scrum = scrum;
        true
    }

    /// Same column toggles the order; a new column starts ascending.
    pub fn set_sort_column(&mut self, column: SortColumn) {
        if column == self.column {
            self.order = self.order.toggle();
        } else {
            self.column = column;
            self.order = SortOrder::Ascending;
        }
    }
}

/// Displayable scrums in a sprint, not counting scrum 0.
fn scrum_count(project: &Project, sprint: u32) -> u32 {
    project
        .sprint(sprint)
        .map_or(0, |s| (s.scrums.len() as u32).saturating_sub(1))
}

/// Step `current` within 1..=count, wrapping at both ends.
fn wrap(current: u32, delta: i64, count: u32) -> u32 {
    let count = i64::from(count);
    let zero_based = (i64::from(current) - 1 + delta).rem_euclid(count);
    (zero_based + 1) as u32
}
