//! Board mutations from the command line.

use anyhow::Result;
use chrono::Utc;
use console::style;

use sprintview::config::SprintviewToml;

use super::super::LifecycleCommands;
use super::open_board;

pub async fn cmd_admin(config: &SprintviewToml, line: &str) -> Result<()> {
    let mut board = open_board(config).await?;
    if board.run_admin(line).await? {
        println!("{} saved to {}", style("Changes").green(), board.origin());
    } else {
        println!("No changes.");
    }
    Ok(())
}

pub async fn cmd_add_tasks(config: &SprintviewToml, spec: &str) -> Result<()> {
    let mut board = open_board(config).await?;
    let outcome = board.add_tasks(spec, Utc::now()).await?;
    for id in &outcome.added {
        println!("{} {}", style("Added").green(), id);
    }
    for id in &outcome.duplicates {
        println!("{} {} (already in sprint)", style("Skipped").yellow(), id);
    }
    if !outcome.changed() {
        println!("No tasks added.");
    }
    Ok(())
}

pub async fn cmd_sprint(config: &SprintviewToml, command: LifecycleCommands) -> Result<()> {
    let mut board = open_board(config).await?;
    match command {
        LifecycleCommands::Open => {
            board.open_new_sprint(Utc::now()).await?;
            let number = board.project().sprints.len();
            println!("{} sprint {}", style("Opened").green(), number);
        }
        LifecycleCommands::Close => {
            board.close_sprint().await?;
            println!("{} sprint {}", style("Closed").green(), board.project().sprints.len());
        }
    }
    Ok(())
}

pub async fn cmd_scrum(config: &SprintviewToml, command: LifecycleCommands) -> Result<()> {
    let mut board = open_board(config).await?;
    match command {
        LifecycleCommands::Open => {
            board.open_new_scrum(Utc::now()).await?;
            let number = board.project().active_scrum().map_or(0, |s| s.number);
            println!("{} scrum {}", style("Opened").green(), number);
        }
        LifecycleCommands::Close => {
            board.close_scrum().await?;
            println!("{} scrum", style("Closed").green());
        }
    }
    Ok(())
}
