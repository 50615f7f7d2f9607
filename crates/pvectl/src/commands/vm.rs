//! VM command handlers.

use chrono::DateTime;
use serde::Serialize;
use tabled::Tabled;

use pve_api::{PveClient, Snapshot, VmAction, VmStatus, VmSummary};

use crate::cli::{GlobalOpts, SnapshotArgs, SnapshotCommand, VmActionArgs, VmArgs, VmCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

/// A VM together with the node it was listed from.
#[derive(Debug, Serialize)]
struct NodeVm {
    node: String,
    #[serde(flatten)]
    vm: VmSummary,
}

#[derive(Tabled)]
struct VmRow {
    #[tabled(rename = "VMID")]
    vmid: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPUs")]
    cpus: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

impl From<&NodeVm> for VmRow {
    fn from(v: &NodeVm) -> Self {
        let status = if v.vm.template == Some(1) {
            "template".to_owned()
        } else {
            v.vm.status.clone()
        };
        Self {
            vmid: v.vm.vmid,
            name: v.vm.name.clone().unwrap_or_default(),
            node: v.node.clone(),
            status,
            cpus: output::or_dash(v.vm.cpus),
            memory: v.vm.maxmem.map_or_else(|| "-".into(), output::fmt_gib),
            uptime: v
                .vm
                .uptime
                .filter(|&u| u > 0)
                .map(output::fmt_uptime)
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "RAM")]
    vmstate: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Snapshot> for SnapshotRow {
    fn from(s: &Snapshot) -> Self {
        Self {
            name: s.name.clone(),
            parent: s.parent.clone().unwrap_or_default(),
            created: s
                .snaptime
                .and_then(|t| DateTime::from_timestamp(t, 0))
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            vmstate: String::from(if s.vmstate == Some(1) { "yes" } else { "" }),
            description: s
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_owned(),
        }
    }
}

fn status_detail(s: &VmStatus, color: bool) -> String {
    let mut lines = vec![
        format!("VMID:     {}", s.vmid),
        format!("Name:     {}", output::or_dash(s.name.as_deref())),
        format!("Status:   {}", output::paint_status(&s.status, color)),
    ];
    if let Some(qmp) = s.qmpstatus.as_deref().filter(|q| *q != s.status) {
        lines.push(format!("QMP:      {qmp}"));
    }
    if let Some(cpu) = s.cpu {
        lines.push(format!(
            "CPU:      {} of {} cores",
            output::fmt_percent(cpu),
            output::or_dash(s.cpus)
        ));
    }
    if let (Some(mem), Some(max)) = (s.mem, s.maxmem) {
        lines.push(format!(
            "Memory:   {} / {}",
            output::fmt_gib(mem),
            output::fmt_gib(max)
        ));
    }
    if let Some(up) = s.uptime.filter(|&u| u > 0) {
        lines.push(format!("Uptime:   {}", output::fmt_uptime(up)));
    }
    if let Some(ref lock) = s.lock {
        lines.push(format!("Lock:     {lock}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &PveClient, args: VmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        VmCommand::List { node } => {
            let nodes = match node {
                Some(node) => vec![node],
                None => client.get_node_list().await?,
            };

            let mut vms = Vec::new();
            for node in nodes {
                let mut listed = client.list_vms(&node).await?;
                listed.sort_by_key(|vm| vm.vmid);
                vms.extend(listed.into_iter().map(|vm| NodeVm {
                    node: node.clone(),
                    vm,
                }));
            }

            let out = output::render_list(
                &global.output,
                &vms,
                |v| VmRow::from(v),
                |v| v.vm.vmid.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VmCommand::Status(target) => {
            let status = client.vm_status(&target.node, target.vmid).await?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| status_detail(s, color),
                |s| s.status.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VmCommand::Start(a) => power(client, VmAction::Start, a, global).await,
        VmCommand::Stop(a) => power(client, VmAction::Stop, a, global).await,
        VmCommand::Shutdown(a) => power(client, VmAction::Shutdown, a, global).await,
        VmCommand::Reboot(a) => power(client, VmAction::Reboot, a, global).await,
        VmCommand::Reset(a) => power(client, VmAction::Reset, a, global).await,
        VmCommand::Suspend(a) => power(client, VmAction::Suspend, a, global).await,
        VmCommand::Resume(a) => power(client, VmAction::Resume, a, global).await,

        VmCommand::Clone {
            source,
            newid,
            name,
            full,
            wait,
        } => {
            let newid = match newid {
                Some(id) => id,
                None => client.next_vmid().await?,
            };
            let upid = client
                .clone_vm(&source.node, source.vmid, newid, name.as_deref(), full)
                .await?;
            if !global.quiet {
                eprintln!("Cloning VM {} to {newid}", source.vmid);
            }
            util::finish_task(client, &source.node, &upid, wait, global.quiet).await
        }

        VmCommand::Snapshot(args) => snapshot(client, args, global).await,
    }
}

async fn power(
    client: &PveClient,
    action: VmAction,
    args: VmActionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let VmActionArgs { target, wait } = args;

    if action.is_disruptive() {
        let prompt = format!("{action} VM {} on {}?", target.vmid, target.node);
        if !util::confirm(&prompt, &format!("vm {action}"), global.yes)? {
            return Ok(());
        }
    }

    let upid = client.vm_action(&target.node, target.vmid, action).await?;
    util::finish_task(client, &target.node, &upid, wait, global.quiet).await
}

async fn snapshot(
    client: &PveClient,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SnapshotCommand::List(target) => {
            let snaps = client.list_snapshots(&target.node, target.vmid).await?;
            let out = output::render_list(
                &global.output,
                &snaps,
                |s| SnapshotRow::from(s),
                |s| s.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SnapshotCommand::Create {
            target,
            name,
            description,
        } => {
            let upid = client
                .create_snapshot(&target.node, target.vmid, &name, description.as_deref())
                .await?;
            util::finish_task(client, &target.node, &upid, false, global.quiet).await
        }

        SnapshotCommand::Rollback { target, name } => {
            let prompt = format!(
                "Roll VM {} back to '{name}'? Current state will be lost.",
                target.vmid
            );
            if !util::confirm(&prompt, "snapshot rollback", global.yes)? {
                return Ok(());
            }
            let upid = client
                .rollback_snapshot(&target.node, target.vmid, &name)
                .await?;
            util::finish_task(client, &target.node, &upid, false, global.quiet).await
        }

        SnapshotCommand::Delete { target, name } => {
            if !util::confirm(
                &format!("Delete snapshot '{name}' of VM {}?", target.vmid),
                "snapshot delete",
                global.yes,
            )? {
                return Ok(());
            }
            let upid = client
                .delete_snapshot(&target.node, target.vmid, &name)
                .await?;
            util::finish_task(client, &target.node, &upid, false, global.quiet).await
        }
    }
}
