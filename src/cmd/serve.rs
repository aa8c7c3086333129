//! Board server command: `sprintview serve`.

use anyhow::Result;

use sprintview::config::SprintviewToml;
use sprintview::server::{ServerConfig, start_server};

use super::open_board;

pub async fn cmd_serve(
    config: &SprintviewToml,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    let mut server = ServerConfig::from(&config.server);
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    server.permissive_cors = cors;

    let board = open_board(config).await?;
    start_server(server, board).await
}
