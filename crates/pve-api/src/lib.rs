// pve-api: Async Rust client for the Proxmox VE management API
//
// Ticket-based session auth, CSRF propagation, and a verb-oriented
// request interface over `/api2/json`. Typed VM helpers sit on top.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod nodes;
pub mod request;
pub mod session;
pub mod transport;
pub mod vm;

pub use client::PveClient;
pub use config::{ConnectionConfig, DEFAULT_PORT, Scheme};
pub use error::Error;
pub use nodes::NodeSummary;
pub use request::{ActionResult, Method};
pub use session::{SessionInfo, TICKET_LIFETIME};
pub use transport::{TlsMode, TransportConfig};
pub use vm::{Snapshot, TaskStatus, VmAction, VmStatus, VmSummary};
