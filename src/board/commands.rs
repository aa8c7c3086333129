//! Text grammars accepted by the board.
//!
//! ```text
//! admin line  := command (';' command)*
//! command     := '-' task_ref          delete task(s)
//!              | 'scrm:' number        delete scrum from the active sprint
//!              | 'sprm:' number        delete sprint
//!              | 'scop'                reopen the last scrum
//!              | 'spop'                reopen the last sprint
//! task list   := task_ref (',' task_ref)*
//! task_ref    := issue | developer ':' issue
//! ```
//!
//! Malformed fragments are logged and skipped; the rest of the line still runs.

use std::collections::BTreeMap;

use tracing::warn;

use super::models::{Progress, TaskId};

/// A reference to one or more tasks by issue number, optionally narrowed to a developer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Issue(u64),
    Assigned { developer: String, issue: u64 },
}

impl TaskRef {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((developer, issue)) => {
                let developer = developer.trim();
                let issue = issue.trim().parse().ok()?;
                if developer.is_empty() {
                    return None;
                }
                Some(Self::Assigned {
                    developer: developer.to_string(),
                    issue,
                })
            }
            None => s.parse().ok().map(Self::Issue),
        }
    }

    pub fn issue(&self) -> u64 {
        match self {
            Self::Issue(issue) | Self::Assigned { issue, .. } => *issue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    DeleteTask(TaskRef),
    DeleteScrum(u32),
    DeleteSprint(u32),
    ReopenScrum,
    ReopenSprint,
}

impl AdminCommand {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(target) = token.strip_prefix('-') {
            return TaskRef::parse(target).map(Self::DeleteTask);
        }
        let (key, value) = match token.split_once(':') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (token, None),
        };
        match (key, value) {
            ("scrm", Some(n)) => n.parse().ok().map(Self::DeleteScrum),
            ("sprm", Some(n)) => n.parse().ok().map(Self::DeleteSprint),
            ("scop", None) => Some(Self::ReopenScrum),
            ("spop", None) => Some(Self::ReopenSprint),
            _ => None,
        }
    }
}

/// Parse a `;`-separated admin line, dropping fragments that do not parse.
pub fn parse_admin_line(line: &str) -> Vec<AdminCommand> {
    line.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let parsed = AdminCommand::parse(token);
            if parsed.is_none() {
                warn!(token, "Skipping malformed admin command");
            }
            parsed
        })
        .collect()
}

/// Parse a `,`-separated task list, dropping entries that do not parse.
pub fn parse_task_list(spec: &str) -> Vec<TaskRef> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = TaskRef::parse(entry);
            if parsed.is_none() {
                warn!(entry, "Skipping malformed task entry");
            }
            parsed
        })
        .collect()
}

/// One task's submitted status in a scrum update.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub progress: Progress,
    pub blocker: String,
    pub today: bool,
}

/// Collect a scrum update from form fields named `progress_<task>`,
/// `blocker_<task>` and `today_<task>`.
///
/// A field missing for a task means zero progress, no blocker, or not
/// worked today. Tasks with an unparseable progress value are dropped.
pub fn parse_update_fields<'a, I>(fields: I) -> Vec<TaskUpdate>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    #[derive(Default)]
    struct Fields<'a> {
        progress: Option<&'a str>,
        blocker: Option<&'a str>,
        today: Option<&'a str>,
    }

    let mut by_task: BTreeMap<&str, Fields<'_>> = BTreeMap::new();
    for (key, value) in fields {
        let Some((kind, task)) = key.split_once('_') else {
            warn!(key, "Ignoring unexpected update field");
            continue;
        };
        if task.is_empty() {
            continue;
        }
        let entry = by_task.entry(task).or_default();
        match kind {
            "progress" => entry.progress = Some(value),
            "blocker" => entry.blocker = Some(value),
            "today" => entry.today = Some(value),
            _ => warn!(key, "Ignoring unexpected update field"),
        }
    }

    by_task
        .into_iter()
        .filter_map(|(task, f)| {
            let progress = match f.progress.unwrap_or("").parse::<Progress>() {
                Ok(p) => p,
                Err(e) => {
                    warn!(task, error = %e, "Skipping update");
                    return None;
                }
            };
            Some(TaskUpdate {
                task_id: TaskId::from(task),
                progress,
                blocker: f.blocker.unwrap_or("").trim().to_string(),
                today: f.today.is_some_and(|v| !v.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // TaskRef
    // =========================================

    #[test]
    fn test_task_ref_parse() {
        assert_eq!(TaskRef::parse("55"), Some(TaskRef::Issue(55)));
        assert_eq!(
            TaskRef::parse(" bob : 55 "),
            Some(TaskRef::Assigned {
                developer: "bob".into(),
                issue: 55
            })
        );
        assert_eq!(TaskRef::parse("bob"), None);
        assert_eq!(TaskRef::parse(":55"), None);
        assert_eq!(TaskRef::parse("bob:x"), None);
    }

    #[test]
    fn test_parse_task_list_skips_malformed() {
        let refs = parse_task_list("bob:55, 55,,oops, 7");
        assert_eq!(
            refs,
            vec![
                TaskRef::Assigned {
                    developer: "bob".into(),
                    issue: 55
                },
                TaskRef::Issue(55),
                TaskRef::Issue(7),
            ]
        );
    }

    // =========================================
    // Admin commands
    // =========================================

    #[test]
    fn test_admin_line_all_commands() {
        let cmds = parse_admin_line("-12; -bob:7 ;scrm:2;sprm:1;scop;spop");
        assert_eq!(
            cmds,
            vec![
                AdminCommand::DeleteTask(TaskRef::Issue(12)),
                AdminCommand::DeleteTask(TaskRef::Assigned {
                    developer: "bob".into(),
                    issue: 7
                }),
                AdminCommand::DeleteScrum(2),
                AdminCommand::DeleteSprint(1),
                AdminCommand::ReopenScrum,
                AdminCommand::ReopenSprint,
            ]
        );
    }

    #[test]
    fn test_admin_line_skips_malformed_and_continues() {
        let cmds = parse_admin_line("scrm:;bogus;sprm:x;scop:1;-;spop");
        assert_eq!(cmds, vec![AdminCommand::ReopenSprint]);
    }

    // =========================================
    // Update fields
    // =========================================

    #[test]
    fn test_parse_update_fields_groups_by_task() {
        let fields = [
            ("progress_bob:55", "40"),
            ("blocker_bob:55", " waiting on review "),
            ("today_bob:55", "on"),
            ("progress_ann:7", "10"),
            ("csrf", "x"),
        ];
        let updates = parse_update_fields(fields);
        assert_eq!(updates.len(), 2);

        let ann = &updates[0];
        assert_eq!(ann.task_id.as_str(), "ann:7");
        assert_eq!(ann.progress.get(), 10);
        assert_eq!(ann.blocker, "");
        assert!(!ann.today);

        let bob = &updates[1];
        assert_eq!(bob.task_id.as_str(), "bob:55");
        assert_eq!(bob.progress.get(), 40);
        assert_eq!(bob.blocker, "waiting on review");
        assert!(bob.today);
    }

    #[test]
    fn test_parse_update_fields_keeps_underscored_ids() {
        let updates = parse_update_fields([("progress_j_doe:3", "5")]);
        assert_eq!(updates[0].task_id.as_str(), "j_doe:3");
    }

    #[test]
    fn test_parse_update_fields_drops_bad_progress() {
        let updates = parse_update_fields([("progress_bob:55", "300"), ("today_ann:1", "on")]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].task_id.as_str(), "ann:1");
        assert_eq!(updates[0].progress, Progress::ZERO);
    }
}
