//! Configuration view and validation commands: `sprintview config`.

use std::path::Path;

use anyhow::Result;

use sprintview::config::{CONFIG_FILE, SprintviewToml};

use super::super::ConfigCommands;

pub fn cmd_config(
    explicit: Option<&Path>,
    effective: &SprintviewToml,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config_path = explicit.unwrap_or(Path::new(CONFIG_FILE));

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Sprint View Configuration");
            println!("=========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found, using defaults.", config_path.display());
            }
            println!();

            println!("[project]");
            println!("  name = \"{}\"", effective.project.name);
            println!();
            println!("[data]");
            println!("  path = \"{}\"", effective.data.path.display());
            println!("  backup_path = \"{}\"", effective.data.backup_path.display());
            println!();
            println!("[remote]");
            println!("  base_url = \"{}\"", effective.remote.base_url);
            println!("  project_id = \"{}\"", effective.remote.project_id);
            println!("  file_path = \"{}\"", effective.remote.file_path);
            println!("  branch = \"{}\"", effective.remote.branch);
            println!();
            println!("[tracker]");
            println!("  base_url = \"{}\"", effective.tracker.base_url);
            println!("  project_id = \"{}\"", effective.tracker.project_id);
            println!("  issue_url = \"{}\"", effective.tracker.issue_url);
            println!();
            println!("[view]");
            println!("  cache_ttl_secs = {}", effective.view.cache_ttl_secs);
            println!("  description_max = {}", effective.view.description_max);
            println!("  developer_max = {}", effective.view.developer_max);
            println!("  default_sort = \"{}\"", effective.view.default_sort);
            println!();
            println!("[server]");
            println!("  host = \"{}\"", effective.server.host);
            println!("  port = {}", effective.server.port);
            println!();
            println!("[log]");
            println!("  dir = \"{}\"", effective.log.dir.display());
            println!("  level = \"{}\"", effective.log.level);
            println!("  file = {}", effective.log.file);
            println!();
            if !effective.developers.is_empty() {
                println!("[developers]");
                for (id, name) in &effective.developers {
                    println!("  {} = \"{}\"", id, name);
                }
                println!();
            }
            println!(
                "token: {}",
                if effective.token.is_some() { "set" } else { "not set" }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = effective.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists.", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            SprintviewToml::default().save(config_path)?;

            println!("Created {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [data] path of the local project document");
            println!("  - [remote] and [tracker] GitLab projects");
            println!("  - [developers] login id to display name");
            println!();
        }
    }

    Ok(())
}
