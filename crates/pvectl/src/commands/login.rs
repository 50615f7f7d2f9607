//! `pvectl login`: authenticate and show the session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pve_api::PveClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct LoginSummary {
    username: String,
    issued_at: DateTime<Utc>,
    expires_in_secs: u64,
    nodes: Vec<String>,
}

fn detail(s: &LoginSummary) -> String {
    [
        format!("User:     {}", s.username),
        format!("Issued:   {}", s.issued_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Expires:  in {}", output::fmt_uptime(s.expires_in_secs)),
        format!("Nodes:    {}", s.nodes.join(", ")),
    ]
    .join("\n")
}

pub async fn handle(client: &PveClient, global: &GlobalOpts) -> Result<(), CliError> {
    // `connect` already logged in; a missing session here means it expired.
    let info = client.session_info().await.ok_or(CliError::NotAuthenticated)?;
    let nodes = client.get_node_list().await.unwrap_or_default();

    let summary = LoginSummary {
        username: info.username.unwrap_or_else(|| {
            let cfg = client.config();
            format!("{}@{}", cfg.username(), cfg.realm())
        }),
        issued_at: info.issued_at,
        expires_in_secs: info.remaining.as_secs(),
        nodes,
    };

    let out = output::render_single(&global.output, &summary, detail, |s| s.username.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
