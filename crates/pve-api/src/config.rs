// Connection identity for a Proxmox VE node.
//
// Validated once at construction and immutable afterwards: the client
// never mutates host, credentials, or TLS policy for the life of a session.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, ToSocketAddrs};

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::Error;

/// The port `pveproxy` listens on.
pub const DEFAULT_PORT: u16 = 8006;

/// URL scheme used to reach the API.
///
/// `Https` is the only mode `pveproxy` itself speaks; `Http` exists for
/// TLS-terminating reverse proxies and local test fixtures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

/// Host, credentials, and TLS policy for one Proxmox VE connection.
#[derive(Clone)]
pub struct ConnectionConfig {
    host: String,
    username: String,
    realm: String,
    password: SecretString,
    port: u16,
    verify_tls: bool,
    scheme: Scheme,
}

impl ConnectionConfig {
    /// Validate and build a connection config.
    ///
    /// Fails with [`Error::Config`] when a string field is empty or the port
    /// is 0, and with [`Error::UnresolvableHost`] when `host` is neither a
    /// literal IP address nor resolvable via DNS.
    ///
    /// Hostname resolution is a blocking system lookup. From async code, call
    /// this through `tokio::task::spawn_blocking`.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        realm: impl Into<String>,
        password: SecretString,
        port: u16,
        verify_tls: bool,
    ) -> Result<Self, Error> {
        let host = host.into();
        let username = username.into();
        let realm = realm.into();

        require_non_empty("host", &host)?;
        require_non_empty("username", &username)?;
        require_non_empty("realm", &realm)?;
        require_non_empty("password", password.expose_secret())?;

        if port == 0 {
            return Err(Error::Config {
                field: "port",
                reason: "must be in 1-65535".into(),
            });
        }

        check_host_resolves(&host, port)?;

        Ok(Self {
            host,
            username,
            realm,
            password,
            port,
            verify_tls,
            scheme: Scheme::Https,
        })
    }

    /// Use a different URL scheme (see [`Scheme`]).
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the peer certificate and hostname are verified.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Origin plus API root: `https://{host}:{port}/api2/json`.
    ///
    /// IPv6 literals are bracketed.
    pub fn api_base(&self) -> String {
        let host = match self.host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]", self.host),
            Err(_) => self.host.clone(),
        };
        format!("{}://{host}:{}/api2/json", self.scheme, self.port)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("realm", &self.realm)
            .field("password", &"[REDACTED]")
            .field("port", &self.port)
            .field("verify_tls", &self.verify_tls)
            .field("scheme", &self.scheme)
            .finish()
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::Config {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

fn check_host_resolves(host: &str, port: u16) -> Result<(), Error> {
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let resolved = (host, port)
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false);

    if resolved {
        debug!(host, "hostname resolved");
        Ok(())
    } else {
        Err(Error::UnresolvableHost { host: host.into() })
    }
}
