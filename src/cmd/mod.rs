//! CLI command implementations.
//!
//! | Module    | Commands handled                               |
//! |-----------|------------------------------------------------|
//! | `project` | `Init`, `Status`                               |
//! | `board`   | `Admin`, `AddTasks`, `Sprint`, `Scrum`         |
//! | `serve`   | `Serve`                                        |
//! | `config`  | `Config`                                       |

pub mod board;
pub mod config;
pub mod project;
pub mod serve;

use anyhow::{Context, Result};

use sprintview::config::SprintviewToml;
use sprintview::repo::open_repository;
use sprintview::service::SprintBoard;
use sprintview::tracker::open_tracker;

use super::Cli;

pub use board::{cmd_add_tasks, cmd_admin, cmd_scrum, cmd_sprint};
pub use config::cmd_config;
pub use project::{StatusArgs, cmd_init, cmd_status};
pub use serve::cmd_serve;

/// File, then environment, then command line flags.
pub fn load_config(cli: &Cli) -> Result<SprintviewToml> {
    let mut config = SprintviewToml::load_or_default(cli.config.as_deref())?;
    config.apply_env();
    if let Some(data) = &cli.data {
        config.data.path = data.clone();
    }
    if cli.verbose {
        config.log.level = "debug".to_string();
    }
    if cli.no_log_file {
        config.log.file = false;
    }
    Ok(config)
}

pub async fn open_board(config: &SprintviewToml) -> Result<SprintBoard> {
    let repo = open_repository(config)?;
    let origin = repo.origin();
    SprintBoard::load(
        repo,
        open_tracker(config)?,
        config.directory(),
        config.view_settings(),
    )
    .await
    .with_context(|| format!("Failed to load project from {}", origin))
}
