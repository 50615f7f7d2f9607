// QEMU VM lifecycle helpers
//
// Fixed endpoint strings and parameter shaping over the public
// get/put/post/delete verbs -- no protocol logic of their own. Mutating
// calls return the task UPID, which callers poll via `task_status`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use crate::client::PveClient;
use crate::error::Error;
use crate::request::decode;

/// Form body for actions that take no parameters.
const NO_PARAMS: &[(&str, &str)] = &[];

/// Power-state transitions under `/status/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum VmAction {
    Start,
    Stop,
    Shutdown,
    Reboot,
    Reset,
    Suspend,
    Resume,
}

impl VmAction {
    /// Actions that interrupt a running guest.
    pub fn is_disruptive(self) -> bool {
        !matches!(self, Self::Start | Self::Resume)
    }
}

/// Entry from `GET /nodes/{node}/qemu`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmSummary {
    #[serde(deserialize_with = "u32_from_any")]
    pub vmid: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<u8>,
}

/// `GET /nodes/{node}/qemu/{vmid}/status/current`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmStatus {
    #[serde(deserialize_with = "u32_from_any")]
    pub vmid: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// "running" or "stopped".
    pub status: String,
    /// Finer-grained QEMU state ("running", "paused", "prelaunch", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qmpstatus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Config lock held by a running operation (e.g. "backup", "snapshot").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
}

/// Entry from `GET .../snapshot`. The list always includes a synthetic
/// `current` entry for the live state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Unix timestamp of creation (absent on `current`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snaptime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmstate: Option<u8>,
}

/// `GET /nodes/{node}/tasks/{upid}/status`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskStatus {
    pub upid: String,
    pub node: String,
    /// "running" or "stopped".
    pub status: String,
    /// "OK" on success, an error message otherwise. Absent while running.
    #[serde(default)]
    pub exitstatus: Option<String>,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub starttime: Option<i64>,
}

impl TaskStatus {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    /// Finished with exit status "OK".
    pub fn succeeded(&self) -> bool {
        !self.is_running() && self.exitstatus.as_deref() == Some("OK")
    }
}

impl PveClient {
    /// `GET /nodes/{node}/qemu`
    pub async fn list_vms(&self, node: &str) -> Result<Vec<VmSummary>, Error> {
        let data = self.get(&format!("/nodes/{node}/qemu")).await?;
        decode(data)
    }

    /// `GET /nodes/{node}/qemu/{vmid}/status/current`
    pub async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus, Error> {
        let data = self
            .get(&format!("/nodes/{node}/qemu/{vmid}/status/current"))
            .await?;
        decode(data)
    }

    /// `POST /nodes/{node}/qemu/{vmid}/status/{action}` -- returns the task UPID.
    pub async fn vm_action(
        &self,
        node: &str,
        vmid: u32,
        action: VmAction,
    ) -> Result<String, Error> {
        debug!(node, vmid, %action, "vm action");
        let path = format!("/nodes/{node}/qemu/{vmid}/status/{action}");
        let data = self.post(&path, NO_PARAMS).await?;
        upid(data)
    }

    /// `POST /nodes/{node}/qemu/{vmid}/clone` -- returns the task UPID.
    pub async fn clone_vm(
        &self,
        node: &str,
        vmid: u32,
        newid: u32,
        name: Option<&str>,
        full: bool,
    ) -> Result<String, Error> {
        let mut params = vec![("newid", newid.to_string())];
        if let Some(name) = name {
            params.push(("name", name.to_owned()));
        }
        if full {
            params.push(("full", "1".to_owned()));
        }
        debug!(node, vmid, newid, "cloning vm");
        let data = self
            .post(&format!("/nodes/{node}/qemu/{vmid}/clone"), &params)
            .await?;
        upid(data)
    }

    /// `PUT /nodes/{node}/qemu/{vmid}/config`
    pub async fn set_vm_config<P>(&self, node: &str, vmid: u32, params: &P) -> Result<(), Error>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.put(&format!("/nodes/{node}/qemu/{vmid}/config"), params)
            .await
    }

    /// `GET /nodes/{node}/qemu/{vmid}/snapshot`
    pub async fn list_snapshots(&self, node: &str, vmid: u32) -> Result<Vec<Snapshot>, Error> {
        let data = self
            .get(&format!("/nodes/{node}/qemu/{vmid}/snapshot"))
            .await?;
        decode(data)
    }

    /// `POST /nodes/{node}/qemu/{vmid}/snapshot` -- returns the task UPID.
    pub async fn create_snapshot(
        &self,
        node: &str,
        vmid: u32,
        snapname: &str,
        description: Option<&str>,
    ) -> Result<String, Error> {
        let mut params = vec![("snapname", snapname)];
        if let Some(description) = description {
            params.push(("description", description));
        }
        let data = self
            .post(&format!("/nodes/{node}/qemu/{vmid}/snapshot"), &params)
            .await?;
        upid(data)
    }

    /// `POST .../snapshot/{snapname}/rollback` -- returns the task UPID.
    pub async fn rollback_snapshot(
        &self,
        node: &str,
        vmid: u32,
        snapname: &str,
    ) -> Result<String, Error> {
        let data = self
            .post(
                &format!("/nodes/{node}/qemu/{vmid}/snapshot/{snapname}/rollback"),
                NO_PARAMS,
            )
            .await?;
        upid(data)
    }

    /// `DELETE .../snapshot/{snapname}` -- returns the task UPID.
    pub async fn delete_snapshot(
        &self,
        node: &str,
        vmid: u32,
        snapname: &str,
    ) -> Result<String, Error> {
        let data = self
            .delete(&format!("/nodes/{node}/qemu/{vmid}/snapshot/{snapname}"))
            .await?;
        upid(data)
    }

    /// `GET /cluster/nextid` -- the next free VM id.
    pub async fn next_vmid(&self) -> Result<u32, Error> {
        let data = self.get("/cluster/nextid").await?;
        u32_from_value(&data).ok_or_else(|| Error::Deserialization {
            message: "expected a numeric VM id".into(),
            body: data.to_string(),
        })
    }

    /// `GET /nodes/{node}/tasks/{upid}/status`
    pub async fn task_status(&self, node: &str, upid: &str) -> Result<TaskStatus, Error> {
        let data = self
            .get(&format!("/nodes/{node}/tasks/{upid}/status"))
            .await?;
        decode(data)
    }
}

fn upid(data: Value) -> Result<String, Error> {
    match data {
        Value::String(upid) => Ok(upid),
        other => Err(Error::Deserialization {
            message: "expected a task UPID string".into(),
            body: other.to_string(),
        }),
    }
}

/// The API reports ids as numbers on some endpoints and strings on others.
fn u32_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn u32_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    u32_from_value(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn action_path_segments() {
        assert_eq!(VmAction::Shutdown.to_string(), "shutdown");
        assert_eq!("resume".parse::<VmAction>().unwrap(), VmAction::Resume);
        assert!("hibernate".parse::<VmAction>().is_err());
    }

    #[test]
    fn disruptive_actions() {
        assert!(VmAction::Stop.is_disruptive());
        assert!(VmAction::Reset.is_disruptive());
        assert!(!VmAction::Start.is_disruptive());
        assert!(!VmAction::Resume.is_disruptive());
    }

    #[test]
    fn vmid_accepts_number_or_string() {
        let a: VmSummary = decode(json!({"vmid": 100, "status": "running"})).unwrap();
        let b: VmSummary = decode(json!({"vmid": "101", "status": "stopped"})).unwrap();
        assert_eq!((a.vmid, b.vmid), (100, 101));
        assert!(decode::<VmSummary>(json!({"vmid": "abc", "status": "x"})).is_err());
    }

    #[test]
    fn upid_must_be_string() {
        assert_eq!(
            upid(json!("UPID:pve1:0001:qmstart:100:root@pam:")).unwrap(),
            "UPID:pve1:0001:qmstart:100:root@pam:"
        );
        assert!(matches!(upid(Value::Null), Err(Error::Deserialization { .. })));
    }

    #[test]
    fn task_status_outcome() {
        let done: TaskStatus = decode(json!({
            "upid": "UPID:pve1:1", "node": "pve1", "status": "stopped",
            "exitstatus": "OK", "type": "qmstart"
        }))
        .unwrap();
        assert!(done.succeeded());

        let running: TaskStatus = decode(json!({
            "upid": "UPID:pve1:2", "node": "pve1", "status": "running", "type": "qmclone"
        }))
        .unwrap();
        assert!(running.is_running());
        assert!(!running.succeeded());
    }
}
