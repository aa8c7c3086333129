//! Carry-forward of unfinished work into a new sprint.
//!
//! A new sprint always starts with two scrums:
//!
//! | Scrum | Active | Holds                                                        |
//! |-------|--------|--------------------------------------------------------------|
//! | 0     | no     | every unfinished task at its last known progress, today off  |
//! | 1     | yes    | the unfinished tasks that were blocked or worked on today    |
//!
//! Tasks that reached 100% are left behind with the sprint that finished them.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::models::{Progress, ProgressSnapshot, Scrum, SprintDate};
use super::sprint::Sprint;
use crate::errors::Result;

/// Build sprint `number`, seeded from the unfinished work of `previous`.
///
/// The previous sprint's last scrum is the reference point, so a scrum that
/// was still open when the sprint ended counts as final.
pub fn seed_sprint(previous: Option<&Sprint>, number: u32, now: DateTime<Utc>) -> Result<Sprint> {
    let mut pending = Scrum::new(0, false);
    let mut outstanding = Scrum::new(1, true);
    let mut tasks = Vec::new();

    if let Some(previous) = previous {
        for task in &previous.tasks {
            let details = previous.final_task_details(&task.id)?;
            let best = details.best_known();
            if best >= Progress::DONE.get() {
                debug!(task = %task.id, "Task finished, not carried forward");
                continue;
            }
            let progress = Progress::new(u32::from(best)).unwrap_or(Progress::ZERO);

            if !details.blocker.is_empty() || details.today {
                outstanding.snapshots.push(ProgressSnapshot {
                    task_id: task.id.clone(),
                    progress,
                    blocker: details.blocker.clone(),
                    today: details.today,
                    submitted_at: now,
                });
            }
            pending.snapshots.push(ProgressSnapshot {
                task_id: task.id.clone(),
                progress,
                blocker: details.blocker,
                today: false,
                submitted_at: now,
            });
            tasks.push(task.clone());
        }
        info!(
            from = previous.number,
            to = number,
            carried = tasks.len(),
            outstanding = outstanding.snapshots.len(),
            "Carried unfinished work forward"
        );
    }

    Ok(Sprint::new(
        number,
        SprintDate::Started(now),
        true,
        tasks,
        vec![pending, outstanding],
    ))
}
