use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "sprintview")]
#[command(version, about = "Status board for the sprints and daily scrums of an Agile project")]
pub struct Cli {
    /// Path to sprintview.toml. Defaults to ./sprintview.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project data file. Overrides data.path and SPRINTVIEW_PATH.
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to the console only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an empty project document to the data path
    Init {
        /// Project name (defaults to project.name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Serve the board over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Allow cross-origin requests
        #[arg(long)]
        cors: bool,
    },
    /// Print the board for a sprint and scrum (default: the latest)
    Status {
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long)]
        scrum: Option<u32>,

        /// Sort column: dev_sort, issue_sort, desc_sort or status_sort
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Print the rendered view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run an admin command line, e.g. "-55;scrm:2;spop"
    Admin {
        #[arg(allow_hyphen_values = true)]
        line: String,
    },
    /// Add tasks to the active sprint, e.g. "55,chris:56"
    AddTasks { spec: String },
    /// Open or close a sprint
    Sprint {
        #[command(subcommand)]
        command: LifecycleCommands,
    },
    /// Open or close a scrum in the active sprint
    Scrum {
        #[command(subcommand)]
        command: LifecycleCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum LifecycleCommands {
    Open,
    Close,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default sprintview.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = cmd::load_config(&cli)?;

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(cli.config.as_deref(), &config, command.clone());
    }

    let _guard = sprintview::logging::init(&config.log)?;

    match &cli.command {
        Commands::Init { name } => cmd::cmd_init(&config, name.as_deref())?,
        Commands::Serve { host, port, cors } => {
            cmd::cmd_serve(&config, host.clone(), *port, *cors).await?
        }
        Commands::Status {
            sprint,
            scrum,
            sort,
            desc,
            json,
        } => {
            cmd::cmd_status(
                &config,
                cmd::StatusArgs {
                    sprint: *sprint,
                    scrum: *scrum,
                    sort: sort.as_deref(),
                    descending: *desc,
                    json: *json,
                },
            )
            .await?
        }
        Commands::Admin { line } => cmd::cmd_admin(&config, line).await?,
        Commands::AddTasks { spec } => cmd::cmd_add_tasks(&config, spec).await?,
        Commands::Sprint { command } => cmd::cmd_sprint(&config, *command).await?,
        Commands::Scrum { command } => cmd::cmd_scrum(&config, *command).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
