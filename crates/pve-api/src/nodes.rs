// Cluster node inventory
//
// `GET /nodes` lists cluster members. The names are cached on the client
// after the first successful listing and only replaced by an explicit
// reload; ticket expiry does not touch the cache.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::PveClient;
use crate::error::Error;
use crate::request::{Method, decode};

/// A node as returned by `GET /nodes`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeSummary {
    /// Node name (e.g. "pve1").
    pub node: String,
    /// "online", "offline", or "unknown".
    #[serde(default)]
    pub status: Option<String>,
    /// CPU usage as a fraction (0.0 - 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxcpu: Option<u32>,
    /// Memory used, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    /// Uptime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

impl PveClient {
    /// Cached node names, fetching them on first use.
    pub async fn get_node_list(&self) -> Result<Vec<String>, Error> {
        if let Some(nodes) = self.nodes.read().await.as_ref() {
            return Ok(nodes.clone());
        }
        self.fetch_node_names().await
    }

    /// Re-query `/nodes` and replace the cached inventory.
    ///
    /// On failure (including an empty listing) the previous cache is kept.
    pub async fn reload_node_list(&self) -> Result<(), Error> {
        self.fetch_node_names().await.map(|_| ())
    }

    /// Full node listing with status and resource usage.
    ///
    /// Also refreshes the cached inventory from the same response.
    pub async fn list_nodes(&self) -> Result<Vec<NodeSummary>, Error> {
        let data = self
            .execute::<()>(Method::Get, "/nodes", None)
            .await?
            .into_data()
            .unwrap_or(Value::Null);
        let nodes: Vec<NodeSummary> = decode(data)?;

        if !nodes.is_empty() {
            let names = nodes.iter().map(|n| n.node.clone()).collect();
            *self.nodes.write().await = Some(names);
        }
        Ok(nodes)
    }

    /// Populate the inventory if it has never been loaded.
    ///
    /// Runs ahead of every public verb. Concurrent callers may both fetch;
    /// the replacement is idempotent.
    pub(crate) async fn ensure_node_inventory(&self) -> Result<(), Error> {
        if self.nodes.read().await.is_some() {
            return Ok(());
        }
        self.fetch_node_names().await.map(|_| ())
    }

    async fn fetch_node_names(&self) -> Result<Vec<String>, Error> {
        let data = self
            .execute::<()>(Method::Get, "/nodes", None)
            .await?
            .into_data()
            .unwrap_or(Value::Null);

        let names = node_names(&data);
        if names.is_empty() {
            debug!("node listing returned no nodes");
            return Err(Error::EmptyNodeList);
        }

        debug!(count = names.len(), "node inventory loaded");
        *self.nodes.write().await = Some(names.clone());
        Ok(names)
    }
}

/// Node names in response order. Entries without a `node` string are skipped.
fn node_names(data: &Value) -> Vec<String> {
    data.as_array()
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| n.get("node").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
