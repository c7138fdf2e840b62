//! Shared configuration for netprobe.
//!
//! TOML profiles for SD-WAN managers and SSH targets, credential resolution
//! (env + keyring + plaintext), and translation into `netprobe_api` settings.
//! The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use netprobe_api::{DeviceType, HostKeyVerification, SshConfig, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "netprobe";

/// Env var that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "NETPROBE_CONFIG";

/// Env var consulted first for manager passwords.
pub const PASSWORD_ENV: &str = "NETPROBE_PASSWORD";

/// Env var consulted first for SSH device passwords.
pub const SSH_PASSWORD_ENV: &str = "NETPROBE_SSH_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for '{profile}'")]
    NoCredentials { profile: String },

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
    /// Default manager profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named SD-WAN manager profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Named SSH targets.
    #[serde(default)]
    pub devices: HashMap<String, DeviceProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
            devices: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Certificate policy for profiles that set no `insecure` of their own.
    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: None,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "plain".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named SD-WAN manager profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Manager base URL (e.g., "https://sandbox-sdwan-2.cisco.com").
    pub manager: String,

    /// Login username.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

/// A named SSH target.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DeviceProfile {
    pub host: String,

    pub port: Option<u16>,

    #[serde(default)]
    pub device_type: DeviceType,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub host_key: HostKeyVerification,

    /// known_hosts override.
    pub known_hosts: Option<PathBuf>,

    pub timeout: Option<u64>,
}

// ── Resolved settings ───────────────────────────────────────────────

/// Everything needed to open a manager session.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `NETPROBE_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "netprobe", "netprobe").map_or_else(
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
    p.push("netprobe");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path, with `NETPROBE_` env overrides.
///
/// Nested keys use a double underscore: `NETPROBE_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETPROBE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the file at `path` alone, without env overrides.
///
/// Used by commands that write the config back, so env values never end
/// up on disk. A missing file gives the default config; a malformed one is
/// an error.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config file");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
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

/// Keyring entry name for a manager profile's password.
pub fn profile_keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Keyring entry name for an SSH target's password.
pub fn device_keyring_key(device_name: &str) -> String {
    format!("device/{device_name}/password")
}

/// Walk the password chain: global env var, profile env var, keyring, plaintext.
fn resolve_password(
    global_env: &str,
    password_env: Option<&str>,
    keyring_key: &str,
    plaintext: Option<&str>,
    label: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Global env var
    if let Ok(pw) = std::env::var(global_env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Profile's password_env → env var lookup
    if let Some(env_name) = password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keyring_key) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(pw) = plaintext {
        return Ok(SecretString::from(pw.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: label.into(),
    })
}

/// Resolve a manager profile's password without CLI flags.
pub fn resolve_manager_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_password(
        PASSWORD_ENV,
        profile.password_env.as_deref(),
        &profile_keyring_key(profile_name),
        profile.password.as_deref(),
        profile_name,
    )
}

/// Resolve an SSH target's password without CLI flags.
pub fn resolve_device_password(
    device: &DeviceProfile,
    device_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_password(
        SSH_PASSWORD_ENV,
        device.password_env.as_deref(),
        &device_keyring_key(device_name),
        device.password.as_deref(),
        &format!("device {device_name}"),
    )
}

/// Parse and check a manager URL.
pub fn parse_manager_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "manager".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "manager".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Transport settings for a profile.
///
/// Managers in labs run self-signed certificates, so certificate checks are
/// off unless a CA is configured or `insecure = false` is set, on the
/// profile or under `[defaults]`. The profile's value wins.
pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let insecure = profile.insecure.or(defaults.insecure);
    let tls = match (insecure, profile.ca_cert.as_ref()) {
        (Some(true), _) => TlsMode::DangerAcceptInvalid,
        (_, Some(ca)) => TlsMode::CustomCa(ca.clone()),
        (Some(false), None) => TlsMode::System,
        (None, None) => TlsMode::DangerAcceptInvalid,
    };
    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        cookie_jar: None,
    }
}

/// Per-invocation values that win over a stored profile.
#[derive(Debug, Clone, Default)]
pub struct ManagerOverrides {
    pub manager: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Force certificate checks off.
    pub insecure: bool,
    /// Timeout in seconds.
    pub timeout: Option<u64>,
}

impl ManagerOverrides {
    /// Apply the TLS and timeout overrides to a transport.
    pub fn apply_transport(&self, mut transport: TransportConfig) -> TransportConfig {
        if self.insecure {
            transport = transport.insecure();
        }
        if let Some(secs) = self.timeout {
            transport = transport.with_timeout(Duration::from_secs(secs));
        }
        transport
    }
}

/// Build `ManagerSettings` from a profile plus per-invocation overrides.
pub fn profile_to_manager_settings(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    overrides: &ManagerOverrides,
) -> Result<ManagerSettings, ConfigError> {
    let url = parse_manager_url(overrides.manager.as_deref().unwrap_or(&profile.manager))?;
    let username = overrides
        .username
        .clone()
        .or_else(|| profile.username.clone())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = match overrides.password {
        Some(ref pw) => pw.clone(),
        None => resolve_manager_password(profile, profile_name)?,
    };

    Ok(ManagerSettings {
        url,
        username,
        password,
        transport: overrides.apply_transport(profile_transport(profile, defaults)),
    })
}

/// Build an `SshConfig` from a device entry, without CLI flag overrides.
pub fn device_to_ssh_config(
    device: &DeviceProfile,
    device_name: &str,
    defaults: &Defaults,
) -> Result<SshConfig, ConfigError> {
    if device.host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("device '{device_name}' has no host"),
        });
    }
    let username = device
        .username
        .clone()
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: format!("device {device_name}"),
        })?;
    let password = resolve_device_password(device, device_name)?;

    let mut cfg = SshConfig::new(device.host.clone(), username, password, device.device_type);
    if let Some(port) = device.port {
        cfg.port = port;
    }
    cfg.host_key_verification = device.host_key;
    cfg.known_hosts_path.clone_from(&device.known_hosts);
    cfg.timeout = Duration::from_secs(device.timeout.unwrap_or(defaults.timeout));
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "sandbox"

[defaults]
timeout = 45

[profiles.sandbox]
manager = "https://sandbox-sdwan-2.cisco.com"
username = "devnetuser"
password_env = "PATH"

[devices.xr1]
host = "sandbox-iosxr-1.cisco.com"
device_type = "cisco_xr"
username = "admin"
host_key = "disabled"
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn loads_profiles_and_devices() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("sandbox"));
        assert_eq!(cfg.defaults.timeout, 45);
        assert_eq!(cfg.defaults.output, "plain");

        let xr1 = &cfg.devices["xr1"];
        assert_eq!(xr1.device_type, DeviceType::CiscoXr);
        assert_eq!(xr1.host_key, HostKeyVerification::Disabled);
        assert_eq!(xr1.port, None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                manager: "https://10.10.20.90".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["lab"].manager, "https://10.10.20.90");
        assert_eq!(loaded.profiles["lab"].username.as_deref(), Some("admin"));
    }

    #[test]
    fn manager_settings_from_profile() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let settings = profile_to_manager_settings(
            &cfg.profiles["sandbox"],
            "sandbox",
            &cfg.defaults,
            &ManagerOverrides::default(),
        )
        .unwrap();

        assert_eq!(settings.url.as_str(), "https://sandbox-sdwan-2.cisco.com/");
        assert_eq!(settings.username, "devnetuser");
        assert_eq!(
            settings.password.expose_secret(),
            std::env::var("PATH").unwrap()
        );
        assert_eq!(settings.transport.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(settings.transport.timeout, Duration::from_secs(45));
    }

    #[test]
    fn manager_profile_without_username_has_no_credentials() {
        let profile = Profile {
            manager: "https://vmanage.example.com".into(),
            ..Profile::default()
        };
        let err = profile_to_manager_settings(
            &profile,
            "lab",
            &Defaults::default(),
            &ManagerOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "lab"));
    }

    #[test]
    fn rejects_non_http_manager_url() {
        assert!(parse_manager_url("ftp://vmanage.example.com").is_err());
        assert!(parse_manager_url("not a url").is_err());
        assert!(parse_manager_url("https://vmanage.example.com").is_ok());
    }

    #[test]
    fn transport_tls_selection() {
        let defaults = Defaults::default();
        let mut profile = Profile::default();
        assert_eq!(
            profile_transport(&profile, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        );

        profile.insecure = Some(false);
        assert_eq!(profile_transport(&profile, &defaults).tls, TlsMode::System);

        profile.ca_cert = Some(PathBuf::from("/etc/ssl/lab-ca.pem"));
        assert_eq!(
            profile_transport(&profile, &defaults).tls,
            TlsMode::CustomCa(PathBuf::from("/etc/ssl/lab-ca.pem"))
        );

        profile.insecure = Some(true);
        assert_eq!(
            profile_transport(&profile, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        );
    }

    #[test]
    fn defaults_insecure_applies_when_profile_is_silent() {
        let defaults = Defaults {
            insecure: Some(false),
            ..Defaults::default()
        };
        let mut profile = Profile::default();
        assert_eq!(profile_transport(&profile, &defaults).tls, TlsMode::System);

        profile.insecure = Some(true);
        assert_eq!(
            profile_transport(&profile, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        );
    }

    #[test]
    fn defaults_section_parses_insecure_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\noutput = \"json\"\ncolor = \"never\"\ninsecure = false\n",
        )
        .unwrap();

        let cfg = load_config_file(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "never");
        assert_eq!(cfg.defaults.insecure, Some(false));
        assert_eq!(cfg.defaults.timeout, 30);
    }

    #[test]
    fn overrides_win_over_profile() {
        let profile = Profile {
            manager: "https://vmanage.example.com".into(),
            username: Some("devnetuser".into()),
            insecure: Some(false),
            ..Profile::default()
        };
        let overrides = ManagerOverrides {
            manager: Some("https://gw.example.com/vmanage".into()),
            username: Some("ops".into()),
            password: Some(SecretString::from("flagpw".to_owned())),
            insecure: true,
            timeout: Some(5),
        };

        let settings =
            profile_to_manager_settings(&profile, "lab", &Defaults::default(), &overrides)
                .unwrap();
        assert_eq!(settings.url.as_str(), "https://gw.example.com/vmanage");
        assert_eq!(settings.username, "ops");
        assert_eq!(settings.password.expose_secret(), "flagpw");
        assert_eq!(settings.transport.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(settings.transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_file_is_an_error_not_a_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.lab\nmanager = ").unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Figment(_))
        ));
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn file_loader_treats_missing_file_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_file(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    }

    #[test]
    fn device_without_host_is_invalid() {
        let device = DeviceProfile {
            username: Some("admin".into()),
            ..DeviceProfile::default()
        };
        let err = device_to_ssh_config(&device, "xr1", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn device_ssh_config_applies_overrides() {
        let device = DeviceProfile {
            host: "sandbox-iosxr-1.cisco.com".into(),
            port: Some(8181),
            device_type: DeviceType::CiscoXr,
            username: Some("admin".into()),
            password_env: Some("PATH".into()),
            host_key: HostKeyVerification::Strict,
            timeout: Some(10),
            ..DeviceProfile::default()
        };
        let cfg = device_to_ssh_config(&device, "xr1", &Defaults::default()).unwrap();
        assert_eq!(cfg.socket_addr(), "sandbox-iosxr-1.cisco.com:8181");
        assert_eq!(cfg.host_key_verification, HostKeyVerification::Strict);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
    }
}
