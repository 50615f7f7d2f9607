//! Task command handlers.

use pve_api::{PveClient, TaskStatus};

use crate::cli::{GlobalOpts, TasksArgs, TasksCommand};
use crate::error::CliError;
use crate::output;

fn detail(t: &TaskStatus) -> String {
    [
        format!("UPID:    {}", t.upid),
        format!("Node:    {}", t.node),
        format!("Type:    {}", t.task_type),
        format!("User:    {}", output::or_dash(t.user.as_deref())),
        format!("Status:  {}", t.status),
        format!("Exit:    {}", output::or_dash(t.exitstatus.as_deref())),
    ]
    .join("\n")
}

pub async fn handle(
    client: &PveClient,
    args: TasksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TasksCommand::Status { node, upid } => {
            let task = client.task_status(&node, &upid).await?;
            let out = output::render_single(&global.output, &task, detail, |t| t.status.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
