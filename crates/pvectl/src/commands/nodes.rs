//! Node command handlers.

use tabled::Tabled;

use pve_api::{NodeSummary, PveClient};

use crate::cli::{GlobalOpts, NodesArgs, NodesCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Cores")]
    cores: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

impl From<&NodeSummary> for NodeRow {
    fn from(n: &NodeSummary) -> Self {
        Self {
            node: n.node.clone(),
            status: output::or_dash(n.status.as_deref()),
            cpu: n.cpu.map(output::fmt_percent).unwrap_or_default(),
            cores: output::or_dash(n.maxcpu),
            memory: match (n.mem, n.maxmem) {
                (Some(used), Some(total)) => {
                    format!("{} / {}", output::fmt_gib(used), output::fmt_gib(total))
                }
                _ => "-".into(),
            },
            uptime: n.uptime.map(output::fmt_uptime).unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &PveClient,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NodesCommand::List => {
            let nodes = client.list_nodes().await?;
            let out = output::render_list(
                &global.output,
                &nodes,
                |n| NodeRow::from(n),
                |n| n.node.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
