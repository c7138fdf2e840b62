//! CLI error types with miette diagnostics.
//!
//! Maps `netprobe_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netprobe_api::Error as ApiError;
use netprobe_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {target}")]
    #[diagnostic(
        code(netprobe::connection_failed),
        help(
            "Check that {target} is running and reachable from this host.\n\
             Use -vv to see the requests being made."
        )
    )]
    ConnectionFailed {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(netprobe::tls_error),
        help(
            "Managers in labs usually run self-signed certificates.\n\
             Use --insecure (-k), or point ca_cert in your profile at the right PEM file."
        )
    )]
    Tls { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for {target}: {message}")]
    #[diagnostic(
        code(netprobe::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: netprobe config set-password"
        )
    )]
    AuthFailed { target: String, message: String },

    #[error("No credentials configured for '{profile}'")]
    #[diagnostic(
        code(netprobe::no_credentials),
        help(
            "Configure credentials with: netprobe config init\n\
             Or pass --username and set NETPROBE_PASSWORD (NETPROBE_SSH_PASSWORD for exec)."
        )
    )]
    NoCredentials { profile: String },

    // ── Manager data ─────────────────────────────────────────────────
    #[error("Failed to retrieve devices (HTTP {status}): {message}")]
    #[diagnostic(code(netprobe::retrieval_failed))]
    RetrievalFailed { status: u16, message: String },

    #[error("Device record has no '{field}' field")]
    #[diagnostic(
        code(netprobe::missing_field),
        help("Use --output json to inspect the raw records.")
    )]
    MissingField { field: String },

    #[error("Unexpected response from manager: {message}")]
    #[diagnostic(code(netprobe::bad_response))]
    BadResponse { message: String },

    // ── SSH ──────────────────────────────────────────────────────────
    #[error("SSH session to {target} failed: {message}")]
    #[diagnostic(code(netprobe::ssh))]
    Ssh { target: String, message: String },

    #[error("Host key check failed: {message}")]
    #[diagnostic(
        code(netprobe::host_key),
        help(
            "Verify the device's key, then fix ~/.ssh/known_hosts.\n\
             For throwaway lab devices: --host-key disabled"
        )
    )]
    HostKey { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netprobe::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netprobe::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netprobe config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Device '{name}' not found in configuration")]
    #[diagnostic(
        code(netprobe::device_not_found),
        help(
            "Available devices: {available}\n\
             Add a [devices.{name}] table to the config file, or use --host."
        )
    )]
    DeviceNotFound { name: String, available: String },

    #[error("No manager configured")]
    #[diagnostic(
        code(netprobe::no_config),
        help(
            "Create a profile with: netprobe config init\n\
             Or pass --manager. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(netprobe::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out talking to {target}")]
    #[diagnostic(
        code(netprobe::timeout),
        help("Increase the timeout with --timeout or check the peer's responsiveness.")
    )]
    Timeout { target: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } | Self::Ssh { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::HostKey { .. } => {
                exit_code::AUTH
            }
            Self::ProfileNotFound { .. } | Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate an API error, naming the peer it came from.
    pub fn from_api(err: ApiError, target: &str) -> Self {
        let target = target.to_owned();
        if err.is_timeout() {
            return Self::Timeout { target };
        }
        if err.is_connect_failure() {
            return Self::ConnectionFailed {
                target,
                source: err.to_string().into(),
            };
        }

        match err {
            ApiError::Authentication { message } => Self::AuthFailed { target, message },
            ApiError::SshAuthentication { user } => Self::AuthFailed {
                target,
                message: format!("user '{user}' rejected"),
            },
            ApiError::Retrieval { status, message } => Self::RetrievalFailed { status, message },
            ApiError::MissingField { field } => Self::MissingField { field },
            ApiError::Tls(message) => Self::Tls { message },
            ApiError::Deserialization { message, .. } => Self::BadResponse { message },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "manager".into(),
                reason: e.to_string(),
            },
            e @ (ApiError::HostKeyUnknown { .. }
            | ApiError::HostKeyChanged { .. }
            | ApiError::KnownHosts(_)) => Self::HostKey {
                message: e.to_string(),
            },
            e @ ApiError::Ssh(_) => Self::Ssh {
                target,
                message: e.to_string(),
            },
            e @ (ApiError::Transport(_) | ApiError::Timeout(_)) => Self::ConnectionFailed {
                target,
                source: e.to_string().into(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}
