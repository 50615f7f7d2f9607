//! Shared configuration for pvectl.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `pve_api::ConnectionConfig`. The CLI layers its
//! flag overrides on top of these helpers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pve_api::{ConnectionConfig, DEFAULT_PORT, Scheme, TransportConfig};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "pvectl";

/// Environment variable consulted before any stored password.
pub const PASSWORD_ENV: &str = "PVECTL_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error(transparent)]
    Connection(#[from] pve_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named cluster profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile names, sorted for stable display.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named Proxmox VE endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Hostname or IP of any cluster node.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    /// Authentication realm ("pam", "pve", or an LDAP/AD realm id).
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Password in plaintext. Prefer the keyring or `password_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Accept any TLS certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// PEM bundle to trust in addition to the system roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// "https" (default) or "http".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: default_username(),
            realm: default_realm(),
            password: None,
            password_env: None,
            insecure: None,
            ca_cert: None,
            timeout: None,
            scheme: None,
        }
    }

    /// `user@realm`, the form the server reports back.
    pub fn user_id(&self) -> String {
        format!("{}@{}", self.username, self.realm)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_username() -> String {
    "root".into()
}
fn default_realm() -> String {
    "pam".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "pvectl", "pvectl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pvectl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `PVECTL_*` variables override file values,
/// with `__` separating nested keys (`PVECTL_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PVECTL_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password.
///
/// Order: `PVECTL_PASSWORD`, the profile's `password_env` variable, the
/// system keyring, then plaintext in the file.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = keyring_entry(profile_name)
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Ok(SecretString::from(pw));
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

// ── Profile → client config ─────────────────────────────────────────

/// Build the client's connection and transport settings from a profile.
///
/// Profile values win over `defaults`. Host resolution happens here, so an
/// unknown hostname fails before any client is built.
pub fn profile_to_connection(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<(ConnectionConfig, TransportConfig), ConfigError> {
    let scheme = match profile.scheme.as_deref() {
        None => Scheme::Https,
        Some(raw) => raw.parse().map_err(|_| ConfigError::Validation {
            field: "scheme".into(),
            reason: format!("expected 'https' or 'http', got '{raw}'"),
        })?,
    };

    let password = resolve_password(profile, profile_name)?;
    let insecure = profile.insecure.unwrap_or(defaults.insecure);

    let connection = ConnectionConfig::new(
        profile.host.as_str(),
        profile.username.as_str(),
        profile.realm.as_str(),
        password,
        profile.port,
        !insecure,
    )?
    .with_scheme(scheme);

    let mut transport = TransportConfig::default().with_timeout(Duration::from_secs(
        profile.timeout.unwrap_or(defaults.timeout),
    ));
    if let Some(ref ca) = profile.ca_cert {
        transport = transport.with_ca_cert(ca);
    }

    Ok((connection, transport))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 45

[profiles.lab]
host = "127.0.0.1"
realm = "pve"
password = "from-file"

[profiles.prod]
host = "10.0.0.5"
port = 443
username = "ops"
password_env = "PROD_PVE_PASSWORD"
insecure = true
"#;

    #[test]
    fn loads_profiles_with_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", SAMPLE)?;

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
            assert_eq!(cfg.defaults.timeout, 45);
            assert_eq!(cfg.defaults.output, "table");
            assert_eq!(cfg.profile_names(), ["lab", "prod"]);

            let lab = &cfg.profiles["lab"];
            assert_eq!(lab.port, DEFAULT_PORT);
            assert_eq!(lab.user_id(), "root@pve");
            assert_eq!(cfg.profiles["prod"].port, 443);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("PVECTL_DEFAULTS__TIMEOUT", "90");
            jail.set_env("PVECTL_DEFAULT_PROFILE", "prod");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.defaults.timeout, 90);
            assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
            Ok(())
        });
    }

    #[test]
    fn non_boolean_insecure_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                "[profiles.lab]\nhost = \"127.0.0.1\"\ninsecure = \"yes\"\n",
            )?;

            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)), "{err:?}");
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert!(cfg.profiles.is_empty());
            assert_eq!(cfg.defaults.timeout, 30);
            Ok(())
        });
    }

    #[test]
    fn password_env_var_wins_over_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env(PASSWORD_ENV, "from-env");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let pw = resolve_password(&cfg.profiles["lab"], "lab").unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&pw), "from-env");
            Ok(())
        });
    }

    #[test]
    fn profile_password_env_is_consulted() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("PROD_PVE_PASSWORD", "prod-secret");

            let mut profile = Profile::new("10.0.0.5");
            profile.password_env = Some("PROD_PVE_PASSWORD".into());
            let pw = resolve_password(&profile, "pvectl-test-prod").unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&pw), "prod-secret");
            Ok(())
        });
    }

    #[test]
    fn connection_from_profile() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let mut profile = Profile::new("127.0.0.1");
            profile.password = Some("pw".into());
            profile.insecure = Some(true);
            profile.timeout = Some(5);
            profile.scheme = Some("http".into());

            let (conn, transport) =
                profile_to_connection(&profile, "pvectl-test-conn", &Defaults::default()).unwrap();
            assert_eq!(conn.api_base(), "http://127.0.0.1:8006/api2/json");
            assert!(!conn.verify_tls());
            assert_eq!(transport.timeout, Duration::from_secs(5));
            Ok(())
        });
    }

    #[test]
    fn bad_scheme_is_validation_error() {
        let mut profile = Profile::new("127.0.0.1");
        profile.password = Some("pw".into());
        profile.scheme = Some("gopher".into());

        let err = profile_to_connection(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "scheme"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("pve.example.com");
        profile.realm = "pve".into();
        cfg.profiles.insert("home".into(), profile);
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[profiles.home]"));
        assert!(text.contains("host = \"pve.example.com\""));
        assert!(!text.contains("password"));
    }
}
