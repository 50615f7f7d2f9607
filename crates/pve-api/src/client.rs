// Proxmox VE API client
//
// Owns the connection identity, the session ticket, and the node inventory
// cache. Protocol mechanics live in `request` (executor), `auth` (login),
// and `nodes` (inventory); this module holds the state and the public verbs.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::request::Method;
use crate::session::SessionState;
use crate::transport::TransportConfig;

/// Authenticated client for one Proxmox VE session.
///
/// One instance corresponds to one ticket. Session state and the node
/// inventory sit behind async locks, so a client can be shared across tasks
/// via `Arc<PveClient>`.
pub struct PveClient {
    http: reqwest::Client,
    config: ConnectionConfig,
    pub(crate) session: RwLock<SessionState>,
    pub(crate) nodes: RwLock<Option<Vec<String>>>,
}

impl PveClient {
    /// Create a client from a validated config and transport settings.
    ///
    /// Starts with no ticket and no cached node inventory.
    pub fn new(config: ConnectionConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client(config.verify_tls())?;
        Ok(Self::with_client(config, http))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the client's TLS policy matching
    /// `config.verify_tls()`.
    pub fn with_client(config: ConnectionConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            session: RwLock::new(SessionState::default()),
            nodes: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Full URL for an already-normalized API path.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{path}", self.config.api_base()))?)
    }

    // ── Public verbs ─────────────────────────────────────────────────

    /// `GET /api2/json{path}`, returning the `data` payload.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        self.ensure_node_inventory().await?;
        let result = self.execute::<()>(Method::Get, path, None).await?;
        Ok(result.into_data().unwrap_or(Value::Null))
    }

    /// `PUT /api2/json{path}` with a form-encoded body. PUT carries no payload back.
    pub async fn put<P>(&self, path: &str, params: &P) -> Result<(), Error>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.ensure_node_inventory().await?;
        self.execute(Method::Put, path, Some(params)).await?;
        Ok(())
    }

    /// `POST /api2/json{path}` with a form-encoded body, returning the `data` payload.
    pub async fn post<P>(&self, path: &str, params: &P) -> Result<Value, Error>
    where
        P: Serialize + ?Sized + Sync,
    {
        self.ensure_node_inventory().await?;
        let result = self.execute(Method::Post, path, Some(params)).await?;
        Ok(result.into_data().unwrap_or(Value::Null))
    }

    /// `DELETE /api2/json{path}`, returning the `data` payload.
    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.ensure_node_inventory().await?;
        let result = self.execute::<()>(Method::Delete, path, None).await?;
        Ok(result.into_data().unwrap_or(Value::Null))
    }
}
