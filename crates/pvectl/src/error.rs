//! CLI error types with miette diagnostics.
//!
//! Maps `pve_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use pve_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TLS: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {host}")]
    #[diagnostic(
        code(pvectl::connection_failed),
        help(
            "Check that the node is reachable and the API listens on the given port.\n\
             Host: {host}"
        )
    )]
    ConnectionFailed {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS certificate verification failed for {host}")]
    #[diagnostic(
        code(pvectl::tls_error),
        help(
            "Proxmox VE ships a self-signed certificate by default.\n\
             Use --insecure (-k) to accept it, or set ca_cert in your profile."
        )
    )]
    TlsError { host: String },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(code(pvectl::tls_config), help("Check the ca_cert path in your profile."))]
    TlsConfig { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(pvectl::auth_failed),
        help(
            "Verify the username, realm, and password.\n\
             Run: pvectl config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(pvectl::no_credentials),
        help(
            "Configure credentials with: pvectl config init\n\
             Or set the PVECTL_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("Session is not authenticated")]
    #[diagnostic(code(pvectl::not_authenticated), help("The ticket expired or login was skipped."))]
    NotAuthenticated,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {code} {reason})")]
    #[diagnostic(code(pvectl::api_error), help("{body}"))]
    ApiError {
        code: u16,
        reason: String,
        body: String,
    },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(pvectl::protocol))]
    Protocol { message: String },

    #[error("Unsupported HTTP method '{verb}'")]
    #[diagnostic(
        code(pvectl::unsupported_method),
        help("Use one of: get, put, post, delete")
    )]
    UnsupportedMethod { verb: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pvectl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(pvectl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: pvectl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No cluster configured")]
    #[diagnostic(
        code(pvectl::no_config),
        help(
            "Create a profile with: pvectl config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(pvectl::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(pvectl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(pvectl::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(pvectl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::TlsError { .. } | Self::TlsConfig { .. } => exit_code::TLS,
            Self::AuthFailed { .. }
            | Self::NoCredentials { .. }
            | Self::NotAuthenticated
            | Self::ApiError {
                code: 401 | 403, ..
            } => exit_code::AUTH,
            Self::ApiError { code: 404, .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::UnsupportedMethod { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── pve_api::Error → CliError mapping ────────────────────────────────

impl From<pve_api::Error> for CliError {
    fn from(err: pve_api::Error) -> Self {
        use pve_api::Error as E;

        match err {
            E::Config { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            E::UnresolvableHost { ref host } => Self::ConnectionFailed {
                host: host.clone(),
                source: Box::new(err),
            },
            E::Authentication { message } => Self::AuthFailed { message },
            E::UntrustedCertificate { host, .. } => Self::TlsError { host },
            E::NotAuthenticated => Self::NotAuthenticated,
            E::UnsupportedMethod(verb) => Self::UnsupportedMethod { verb },
            E::Transport(e) => Self::ConnectionFailed {
                host: e
                    .url()
                    .and_then(|u| u.host_str())
                    .unwrap_or("server")
                    .to_owned(),
                source: Box::new(e),
            },
            E::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            E::Tls(message) => Self::TlsConfig { message },
            E::Http { code, reason, body } => Self::ApiError { code, reason, body },
            other @ (E::MalformedResponse { .. }
            | E::EmptyPayload { .. }
            | E::EmptyNodeList
            | E::Deserialization { .. }) => Self::Protocol {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Connection(e) => e.into(),
            other => Self::Config(other),
        }
    }
}
