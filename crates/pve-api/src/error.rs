use thiserror::Error;

/// Top-level error type for the `pve-api` crate.
///
/// Every failure the client can report is a distinct variant so callers can
/// tell "not logged in", "server rejected the request", and "could not reach
/// the server" apart without string matching.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Invalid `ConnectionConfig` input (empty field, port out of range).
    #[error("Invalid connection config: {field}: {reason}")]
    Config { field: &'static str, reason: String },

    /// Hostname neither resolves nor parses as a literal IP address.
    #[error("Cannot resolve host '{host}'")]
    UnresolvableHost { host: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the server, or the ticket response was unusable.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// TLS peer certificate was rejected while verification was enabled.
    #[error("TLS certificate presented by {host} is not trusted")]
    UntrustedCertificate {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    /// No valid ticket at call time (never logged in, or ticket expired).
    #[error("Not authenticated -- no valid ticket, log in first")]
    NotAuthenticated,

    // ── Request ─────────────────────────────────────────────────────
    /// HTTP verb outside GET/PUT/POST/DELETE.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Network or TLS failure before any HTTP response (refused, timeout, DNS).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client's TLS configuration failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response ────────────────────────────────────────────────────
    /// Server answered with a status other than 200.
    #[error("HTTP {code} {reason}")]
    Http {
        code: u16,
        reason: String,
        body: String,
    },

    /// Response head or body could not be read.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Status 200 but the body was not JSON or had no `data` field.
    #[error("Response from {path} carried no usable data payload")]
    EmptyPayload { path: String },

    /// The cluster's node listing came back empty.
    #[error("Cluster returned an empty node list")]
    EmptyNodeList,

    /// A `data` payload did not match the expected typed shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Http { code: 401, .. } | Self::Authentication { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying by the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { code, .. } => matches!(code, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` for errors raised while validating construction input.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::UnresolvableHost { .. })
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
