//! Sprint board domain model.
//!
//! ## Hierarchy
//!
//! ```text
//! Project ──< Sprint ──< Scrum ──< ProgressSnapshot
//!               │
//!               └──< TaskRecord
//! ```
//!
//! | Module       | Responsibility                                          |
//! |--------------|---------------------------------------------------------|
//! | `models`     | `TaskId`, `Progress`, `TaskRecord`, `Scrum`, snapshots  |
//! | `sprint`     | `Sprint`: scrum lifecycle, task registry, task details  |
//! | `project`    | `Project` aggregate: sprint lifecycle, updates, admin   |
//! | `carry`      | Seeding a new sprint from the unfinished previous one   |
//! | `commands`   | Admin line, task list and update form grammars          |
//! | `developers` | Login id ↔ display name translation                     |
//! | `document`   | JSON wire types and validated conversion                |

pub mod carry;
pub mod commands;
pub mod developers;
pub mod document;
pub mod models;
pub mod project;
pub mod sprint;

pub use commands::{AdminCommand, TaskRef, TaskUpdate};
pub use developers::DeveloperDirectory;
pub use document::ProjectDocument;
pub use models::{Progress, ProgressSnapshot, Scrum, SprintDate, TaskDetails, TaskId, TaskRecord};
pub use project::{DevTask, Project};
pub use sprint::{AddTasksOutcome, NewTask, Sprint};
