// Transport configuration for building the reqwest::Client behind PveClient.
//
// Holds the per-deployment knobs (timeout, CA bundle) and turns the
// connection's TLS-verification flag into a concrete rustls setup.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the bundled web PKI roots.
    System,
    /// Trust an additional CA certificate from the given PEM file
    /// (e.g. the cluster's `/etc/pve/pve-root-ca.pem`).
    CustomCa(PathBuf),
    /// Accept any certificate and any hostname. Opt-in only.
    DangerAcceptInvalid,
}

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connect + request timeout for every call, including login.
    pub timeout: Duration,
    /// Extra CA to trust when verification is enabled.
    pub ca_cert: Option<PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            ca_cert: None,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Resolve the TLS mode for a connection.
    ///
    /// Disabled verification always wins over a configured CA.
    pub fn tls_mode(&self, verify_tls: bool) -> TlsMode {
        match (verify_tls, &self.ca_cert) {
            (false, _) => TlsMode::DangerAcceptInvalid,
            (true, Some(path)) => TlsMode::CustomCa(path.clone()),
            (true, None) => TlsMode::System,
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self, verify_tls: bool) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(concat!("pvectl/", env!("CARGO_PKG_VERSION")));

        match self.tls_mode(verify_tls) {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(&path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Map a reqwest failure onto the crate's error classification.
///
/// Certificate rejections become [`Error::UntrustedCertificate`] (only
/// reachable with verification on). An unparsable status line or header
/// block, or an unreadable body, becomes [`Error::MalformedResponse`].
/// Everything else is [`Error::Transport`].
pub(crate) fn classify(err: reqwest::Error, host: &str) -> Error {
    if is_certificate_error(&err) {
        return Error::UntrustedCertificate {
            host: host.into(),
            source: err,
        };
    }
    if err.is_body() || err.is_decode() || is_parse_error(&err) {
        return Error::MalformedResponse {
            message: err.to_string(),
        };
    }
    Error::Transport(err)
}

fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    chain_any(err, &|e| {
        matches!(
            e.downcast_ref::<rustls::Error>(),
            Some(rustls::Error::InvalidCertificate(_))
        )
    })
}

/// hyper rejected the response head (bad status line, bad headers).
fn is_parse_error(err: &(dyn StdError + 'static)) -> bool {
    chain_any(err, &|e| {
        e.downcast_ref::<hyper::Error>()
            .is_some_and(hyper::Error::is_parse)
    })
}

/// Walk the source chain looking for an error matching `pred`.
///
/// hyper and tokio-rustls wrap inner errors in `std::io::Error`, whose
/// `source()` skips the wrapped value, so unwrap those explicitly.
fn chain_any(
    err: &(dyn StdError + 'static),
    pred: &dyn Fn(&(dyn StdError + 'static)) -> bool,
) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if pred(e) {
            return true;
        }
        if let Some(inner) = e.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            if chain_any(inner, pred) {
                return true;
            }
        }
        current = e.source();
    }
    false
}
