//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod api;
pub mod config_cmd;
pub mod login;
pub mod nodes;
pub mod tasks;
pub mod util;
pub mod vm;

use pve_api::PveClient;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Build a client from the resolved profile and log in.
///
/// Profile resolution runs on the blocking pool: it reads the config file
/// and the keyring, and validating the host does a DNS lookup.
pub async fn connect(global: &GlobalOpts) -> Result<PveClient, CliError> {
    let opts = global.clone();
    let (connection, transport) =
        tokio::task::spawn_blocking(move || config::build_connection(&opts))
            .await
            .map_err(|e| CliError::Io(std::io::Error::other(e)))??;
    let client = PveClient::new(connection, &transport)?;
    client.login().await?;
    Ok(client)
}

/// Dispatch a cluster-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &PveClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login => login::handle(client, global).await,
        Command::Nodes(args) => nodes::handle(client, args, global).await,
        Command::Vm(args) => vm::handle(client, args, global).await,
        Command::Tasks(args) => tasks::handle(client, args, global).await,
        // Api, Config and Completions are handled before dispatch
        Command::Api(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
