//! CLI-side profile resolution: `GlobalOpts` overrides on top of
//! `pve_config` profiles, producing the client's connection settings.

use pve_api::{ConnectionConfig, TransportConfig};
use pve_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use pve_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply flag / env overrides to a profile. Flags win over file values.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(ref user) = global.user {
        profile.username.clone_from(user);
    }
    if let Some(ref realm) = global.realm {
        profile.realm.clone_from(realm);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Build connection settings from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--host` alone is enough (the password then
/// has to come from `PVECTL_PASSWORD`).
pub fn build_connection(
    global: &GlobalOpts,
) -> Result<(ConnectionConfig, TransportConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None => {
            let host = global.host.as_deref().ok_or_else(|| {
                if global.profile.is_some() {
                    CliError::ProfileNotFound {
                        name: profile_name.clone(),
                        available: available_profiles(&cfg),
                    }
                } else {
                    CliError::NoConfig {
                        path: config_path().display().to_string(),
                    }
                }
            })?;
            Profile::new(host)
        }
    };

    apply_overrides(&mut profile, global);
    tracing::debug!(
        profile = %profile_name,
        host = %profile.host,
        user = %profile.user_id(),
        "resolved connection profile"
    );

    Ok(pve_config::profile_to_connection(
        &profile,
        &profile_name,
        &cfg.defaults,
    )?)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let names = cfg.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
