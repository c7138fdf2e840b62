//! CLI configuration: thin wrapper around `netprobe_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` / `ExecArgs` flag overrides.

use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;
use strum::IntoEnumIterator;

use netprobe_api::{DeviceType, HostKeyVerification, SshConfig};
use netprobe_config::{ManagerOverrides, ManagerSettings, PASSWORD_ENV, SSH_PASSWORD_ENV};

use crate::cli::{ExecArgs, GlobalOpts};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netprobe_config::{
    Config, DeviceProfile, KEYRING_SERVICE, Profile, config_path, device_keyring_key,
    load_config, load_config_file, profile_keyring_key, save_config,
};

// ── Global defaults ─────────────────────────────────────────────────

/// Fill `--output` and `--color` from `[defaults]` when no flag was given.
pub fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_value("defaults.output", &cfg.defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_value("defaults.color", &cfg.defaults.color)?);
    }
    Ok(())
}

fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

// ── Manager ─────────────────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build manager session settings from the config file, profile, and CLI overrides.
pub fn resolve_manager(global: &GlobalOpts, cfg: &Config) -> Result<ManagerSettings, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let overrides = ManagerOverrides {
        manager: global.manager.clone(),
        username: global.username.clone(),
        password: global.password.clone().map(SecretString::from),
        insecure: global.insecure,
        timeout: global.timeout,
    };

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return Ok(netprobe_config::profile_to_manager_settings(
            profile,
            &profile_name,
            &cfg.defaults,
            &overrides,
        )?);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.manager.is_none() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_names(cfg.profiles.keys()),
        });
    }

    // No profile: build from flags / env vars alone
    let url_str = global.manager.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = netprobe_config::parse_manager_url(url_str)?;

    let username = global
        .username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?;
    let password = flag_or_env(global.password.as_deref(), PASSWORD_ENV).ok_or(
        CliError::NoCredentials {
            profile: profile_name,
        },
    )?;

    let transport = overrides.apply_transport(netprobe_config::profile_transport(
        &Profile::default(),
        &cfg.defaults,
    ));

    Ok(ManagerSettings {
        url,
        username,
        password,
        transport,
    })
}

// ── SSH targets ─────────────────────────────────────────────────────

/// Build an `SshConfig` from `--target` (a `[devices.*]` entry) or `--host`.
///
/// Flags override the stored device entry field by field.
pub fn resolve_ssh(args: &ExecArgs, global: &GlobalOpts, cfg: &Config) -> Result<SshConfig, CliError> {
    let device_type = args
        .device_type
        .as_deref()
        .map(parse_device_type)
        .transpose()?;
    let host_key = args.host_key.as_deref().map(parse_host_key).transpose()?;

    let mut ssh = match args.target.as_deref() {
        Some(name) => {
            let device = cfg
                .devices
                .get(name)
                .ok_or_else(|| CliError::DeviceNotFound {
                    name: name.into(),
                    available: available_names(cfg.devices.keys()),
                })?;
            device_settings(device, name, args, cfg)?
        }
        None => adhoc_settings(args, cfg)?,
    };

    if let Some(device_type) = device_type {
        ssh.device_type = device_type;
    }
    if let Some(mode) = host_key {
        ssh.host_key_verification = mode;
    }
    if let Some(port) = args.port {
        ssh.port = port;
    }
    if let Some(secs) = global.timeout {
        ssh.timeout = Duration::from_secs(secs);
    }
    Ok(ssh)
}

fn device_settings(
    device: &DeviceProfile,
    name: &str,
    args: &ExecArgs,
    cfg: &Config,
) -> Result<SshConfig, CliError> {
    if args.ssh_username.is_none() && args.ssh_password.is_none() {
        return Ok(netprobe_config::device_to_ssh_config(
            device,
            name,
            &cfg.defaults,
        )?);
    }

    let username = args
        .ssh_username
        .clone()
        .or_else(|| device.username.clone())
        .ok_or_else(|| CliError::NoCredentials {
            profile: format!("device {name}"),
        })?;
    let password = match args.ssh_password.as_deref() {
        Some(pw) => SecretString::from(pw.to_owned()),
        None => netprobe_config::resolve_device_password(device, name)?,
    };

    let mut ssh = SshConfig::new(device.host.clone(), username, password, device.device_type);
    if let Some(port) = device.port {
        ssh.port = port;
    }
    ssh.host_key_verification = device.host_key;
    ssh.known_hosts_path.clone_from(&device.known_hosts);
    ssh.timeout = Duration::from_secs(device.timeout.unwrap_or(cfg.defaults.timeout));
    Ok(ssh)
}

fn adhoc_settings(args: &ExecArgs, cfg: &Config) -> Result<SshConfig, CliError> {
    let host = args.host.clone().ok_or_else(|| CliError::Validation {
        field: "host".into(),
        reason: "pass --host <HOST> or --target <NAME>".into(),
    })?;
    let username = args
        .ssh_username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: host.clone(),
        })?;
    let password = flag_or_env(args.ssh_password.as_deref(), SSH_PASSWORD_ENV).ok_or_else(
        || CliError::NoCredentials {
            profile: host.clone(),
        },
    )?;

    let mut ssh = SshConfig::new(host, username, password, DeviceType::default());
    ssh.timeout = Duration::from_secs(cfg.defaults.timeout);
    Ok(ssh)
}

// ── Helpers ─────────────────────────────────────────────────────────

fn flag_or_env(flag: Option<&str>, env_name: &str) -> Option<SecretString> {
    flag.map(str::to_owned)
        .or_else(|| std::env::var(env_name).ok())
        .map(SecretString::from)
}

fn parse_device_type(raw: &str) -> Result<DeviceType, CliError> {
    DeviceType::from_str(raw).map_err(|_| CliError::Validation {
        field: "device-type".into(),
        reason: format!(
            "unknown device type '{raw}', expected one of: {}",
            DeviceType::iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

fn parse_host_key(raw: &str) -> Result<HostKeyVerification, CliError> {
    HostKeyVerification::from_str(raw).map_err(|_| CliError::Validation {
        field: "host-key".into(),
        reason: format!("unknown mode '{raw}', expected strict, accept-new or disabled"),
    })
}

fn available_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
