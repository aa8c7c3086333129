//! Progress diff: how a task's progress is shown for one scrum.
//!
//! The board draws progress as a horizontal bar built from text. The muted
//! segment is the progress already reported before the scrum, the light
//! segment is what the scrum added, and `[N]` closes the bar with the total.
//! Each segment is padded to roughly half its value in characters so the
//! bar lengths line up across rows.

use serde::Serialize;

use crate::board::TaskDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Nothing reported in this or any earlier scrum: `[0]`.
    NoProgress,
    /// Total unchanged, or nothing reported in this scrum yet.
    Steady,
    /// This scrum moved progress forward.
    Gain,
    /// This scrum reported less than before. Display only; the data stays.
    Regression,
}

/// Structured status of one task as of one scrum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCell {
    pub kind: StatusKind,
    /// Total shown in brackets and used for sorting by status.
    pub displayed: u8,
    /// Muted base segment, zero when not drawn.
    pub previous: u8,
    /// Change against the previous scrum; zero unless `Gain` or `Regression`.
    pub gain: i16,
    pub blocked: bool,
    pub today: bool,
}

impl StatusCell {
    pub fn from_details(details: &TaskDetails) -> Self {
        let progress = details.progress;
        let previous = details.previous;
        let blocked = !details.blocker.is_empty();
        let today = details.today;

        if progress == 0 && previous == 0 {
            return Self {
                kind: StatusKind::NoProgress,
                displayed: 0,
                previous: 0,
                gain: 0,
                blocked,
                today,
            };
        }

        let gain = if progress != 0 {
            i16::from(progress) - i16::from(previous)
        } else {
            0
        };

        let (kind, displayed, base) = match gain {
            g if g > 0 => (StatusKind::Gain, progress, previous),
            g if g < 0 => (StatusKind::Regression, progress, progress),
            _ => (StatusKind::Steady, previous, previous),
        };

        Self {
            kind,
            displayed,
            previous: base,
            gain,
            blocked,
            today,
        }
    }

    /// Filler characters before the base segment's label.
    pub fn base_padding(&self) -> usize {
        padding(i32::from(self.previous), self.previous)
    }

    /// Filler characters before the gain label of a `Gain` cell.
    pub fn gain_padding(&self) -> usize {
        padding(i32::from(self.gain), self.gain)
    }

    /// Dashes in the leftward arrow of a `Regression` cell.
    pub fn regression_dashes(&self) -> usize {
        let magnitude = i32::from(self.gain.unsigned_abs());
        let label = label_len(self.gain) as i32;
        (magnitude / 2 - label - 1).max(0) as usize
    }
}

fn label_len(value: impl ToString) -> usize {
    value.to_string().len()
}

fn padding(value: i32, label: impl ToString) -> usize {
    (value / 2 - label_len(label) as i32).max(0) as usize
}
