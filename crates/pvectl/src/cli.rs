//! Clap derive structures for the `pvectl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pvectl -- command-line client for the Proxmox VE API
#[derive(Debug, Parser)]
#[command(
    name = "pvectl",
    version,
    about = "Manage Proxmox VE clusters from the command line",
    long_about = "A CLI for the Proxmox VE management API.\n\n\
        Authenticates with a username/password ticket and talks to\n\
        /api2/json on any cluster node. Use `pvectl api` for raw access\n\
        to endpoints without a dedicated command.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Cluster profile to use
    #[arg(long, short = 'p', env = "PVECTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Node hostname or IP (overrides profile)
    #[arg(long, short = 'H', env = "PVECTL_HOST", global = true)]
    pub host: Option<String>,

    /// API port (default 8006)
    #[arg(long, env = "PVECTL_PORT", global = true)]
    pub port: Option<u16>,

    /// Login user without realm, e.g. "root"
    #[arg(long, short = 'u', env = "PVECTL_USER", global = true)]
    pub user: Option<String>,

    /// Authentication realm, e.g. "pam" or "pve"
    #[arg(long, env = "PVECTL_REALM", global = true)]
    pub realm: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PVECTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PVECTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PVECTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and show the session ticket details
    Login,

    /// Raw API access: pvectl api <get|put|post|delete> <path> [key=value...]
    Api(ApiArgs),

    /// Cluster nodes
    #[command(alias = "node", alias = "n")]
    Nodes(NodesArgs),

    /// QEMU virtual machines
    #[command(alias = "qm")]
    Vm(VmArgs),

    /// Background tasks started by mutating calls
    #[command(alias = "task")]
    Tasks(TasksArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Api ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApiArgs {
    /// HTTP verb: get, put, post, or delete
    pub method: String,

    /// API path below /api2/json, e.g. /nodes/pve1/status
    pub path: String,

    /// Form parameters as key=value
    pub params: Vec<String>,
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List cluster nodes with status and usage
    #[command(alias = "ls")]
    List,
}

// ── VM ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VmArgs {
    #[command(subcommand)]
    pub command: VmCommand,
}

/// Node + VM id pair shared by per-VM commands.
#[derive(Debug, Args)]
pub struct VmTarget {
    /// Node hosting the VM
    pub node: String,

    /// VM id
    pub vmid: u32,
}

#[derive(Debug, Args)]
pub struct VmActionArgs {
    #[command(flatten)]
    pub target: VmTarget,

    /// Wait for the task to finish
    #[arg(long, short = 'w')]
    pub wait: bool,
}

#[derive(Debug, Subcommand)]
pub enum VmCommand {
    /// List VMs (all nodes unless --node is given)
    #[command(alias = "ls")]
    List {
        /// Only list VMs on this node
        #[arg(long, short = 'n')]
        node: Option<String>,
    },

    /// Show the current status of a VM
    Status(VmTarget),

    /// Start a VM
    Start(VmActionArgs),

    /// Hard-stop a VM
    Stop(VmActionArgs),

    /// Ask the guest OS to shut down
    Shutdown(VmActionArgs),

    /// Ask the guest OS to reboot
    Reboot(VmActionArgs),

    /// Hard-reset a VM
    Reset(VmActionArgs),

    /// Pause a VM
    Suspend(VmActionArgs),

    /// Resume a paused VM
    Resume(VmActionArgs),

    /// Clone a VM or template
    Clone {
        #[command(flatten)]
        source: VmTarget,

        /// Id for the new VM (next free id if omitted)
        #[arg(long)]
        newid: Option<u32>,

        /// Name for the new VM
        #[arg(long)]
        name: Option<String>,

        /// Full clone instead of a linked clone
        #[arg(long)]
        full: bool,

        /// Wait for the task to finish
        #[arg(long, short = 'w')]
        wait: bool,
    },

    /// Manage snapshots
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// List snapshots of a VM
    #[command(alias = "ls")]
    List(VmTarget),

    /// Take a snapshot
    Create {
        #[command(flatten)]
        target: VmTarget,

        /// Snapshot name
        name: String,

        /// Free-form description
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Roll a VM back to a snapshot
    Rollback {
        #[command(flatten)]
        target: VmTarget,

        /// Snapshot name
        name: String,
    },

    /// Delete a snapshot
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        target: VmTarget,

        /// Snapshot name
        name: String,
    },
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// Show the status of a task by UPID
    Status {
        /// Node the task runs on
        node: String,

        /// Task UPID as returned by a mutating command
        upid: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
