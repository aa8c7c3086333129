//! Project bootstrap and board printout: `sprintview init`, `sprintview status`.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use console::style;

use sprintview::board::ProjectDocument;
use sprintview::config::SprintviewToml;
use sprintview::repo::FileRepository;
use sprintview::view::{BoardHeader, RenderedView, SortColumn, StatusCell, StatusKind, TaskRow};

use super::open_board;

pub fn cmd_init(config: &SprintviewToml, name: Option<&str>) -> Result<()> {
    let path = &config.data.path;
    if path.exists() {
        bail!(
            "Project data already exists at {}. Delete it first if you want to recreate it.",
            path.display()
        );
    }
    let name = name.unwrap_or(&config.project.name);
    FileRepository::create(path, &ProjectDocument::empty(name))
        .with_context(|| format!("Failed to create project data at {}", path.display()))?;

    println!();
    println!("{} project '{}' at {}", style("Created").green(), name, path.display());
    println!();
    println!("Next: 'sprintview sprint open' starts sprint 1.");
    println!();
    Ok(())
}

pub struct StatusArgs<'a> {
    pub sprint: Option<u32>,
    pub scrum: Option<u32>,
    pub sort: Option<&'a str>,
    pub descending: bool,
    pub json: bool,
}

pub async fn cmd_status(config: &SprintviewToml, args: StatusArgs<'_>) -> Result<()> {
    let mut board = open_board(config).await?;

    if let Some(sprint) = args.sprint {
        if !board.select(sprint, args.scrum) {
            bail!(
                "No scrum {} in sprint {}",
                args.scrum.map_or_else(|| "-".to_string(), |n| n.to_string()),
                sprint
            );
        }
    } else if let Some(scrum) = args.scrum {
        let sprint = board.view().cursor().sprint();
        if !board.select(sprint, Some(scrum)) {
            bail!("No scrum {} in sprint {}", scrum, sprint);
        }
    }

    if let Some(column) = args.sort {
        let column: SortColumn = column.parse().map_err(anyhow::Error::msg)?;
        if column != board.view().cursor().column() {
            board.sort(column);
        }
    }
    if args.descending {
        let column = board.view().cursor().column();
        board.sort(column);
    }

    let view = board.rendered()?;
    let header = board.header(Utc::now())?;

    if args.json {
        let out = serde_json::json!({ "header": header, "view": *view });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_board(&header, &view);
    }
    Ok(())
}

fn print_board(header: &BoardHeader, view: &RenderedView) {
    println!();
    println!("{}", style(format!("Sprint View: {}", header.project)).bold());
    println!(
        "Sprint {} of {}  started {}  tasks {}{}",
        header.sprint,
        header.num_sprints,
        header.sprint_date,
        header.num_tasks,
        if header.sprint_active { "" } else { "  (closed)" }
    );
    if header.scrum_active {
        println!("Scrum {} of {}", header.scrum, header.num_scrums);
        if !header.developers.is_empty() {
            println!("Updating: {}", header.developers.join(", "));
        }
    } else {
        println!(
            "Scrum {} of {}  {}",
            header.scrum,
            header.num_scrums,
            style("No Active Scrum").red()
        );
    }
    println!();

    if view.tasks.is_empty() {
        println!("No tasks.");
    } else {
        println!(
            "{:<10} {:>6}  {:<40} Status",
            "Developer", "Issue", "Description"
        );
        println!("{:<10} {:>6}  {:<40} ------", "---------", "-----", "-----------");
        for row in &view.tasks {
            print_row(row);
        }
    }
    println!();

    if view.blockers.is_empty() {
        println!("Blockers: None");
    } else {
        println!("Blockers:");
        for (i, b) in view.blockers.iter().enumerate() {
            println!(
                "  {}. {}: {}: {}: {}",
                i + 1,
                b.developer,
                b.issue,
                b.description,
                style(&b.blocker).red()
            );
        }
    }
    println!();
}

fn print_row(row: &TaskRow) {
    let description: String = row.description.chars().take(40).collect();
    let description = format!("{:<40}", description);
    let description = if row.today {
        style(description).yellow().to_string()
    } else {
        description
    };
    println!(
        "{:<10} {:>6}  {} {}",
        row.developer,
        row.issue,
        description,
        status_text(&row.status)
    );
}

/// Plain-text progress: `base +gain [total]`.
pub fn status_text(cell: &StatusCell) -> String {
    let mut out = match cell.kind {
        StatusKind::NoProgress => "[0]".to_string(),
        StatusKind::Gain if cell.previous == 0 => format!("+{} [{}]", cell.gain, cell.displayed),
        StatusKind::Gain => format!("{} +{} [{}]", cell.previous, cell.gain, cell.displayed),
        StatusKind::Steady => format!("{} [{}]", cell.previous, cell.displayed),
        StatusKind::Regression => format!("[{}] <{}", cell.displayed, cell.gain),
    };
    if cell.blocked {
        out.push_str(&format!(" {}", style("Blocked").red()));
    }
    out
}
