use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `netprobe-api` crate.
///
/// Covers both surfaces the crate talks to: the SD-WAN Manager REST session
/// and the one-shot SSH command runner. The CLI maps these into user-facing
/// diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Manager session ─────────────────────────────────────────────
    /// Login rejected: non-200 status or no session cookie in the response.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A listing call returned something other than 200 OK.
    #[error("Retrieval failed (HTTP {status}): {message}")]
    Retrieval { status: u16, message: String },

    // ── Records ─────────────────────────────────────────────────────
    /// Strict lookup on a device record hit a key that isn't there.
    #[error("Device record has no field '{field}'")]
    MissingField { field: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable CA file, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── SSH ─────────────────────────────────────────────────────────
    /// SSH handshake or protocol error.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// The device rejected the SSH credentials.
    #[error("SSH authentication failed for user '{user}'")]
    SshAuthentication { user: String },

    /// Host is not in known_hosts and strict checking is on.
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the known_hosts entry.
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written.
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connecting or waiting for command output took too long.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Returns `true` if this error came from a rejected login or expired session.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Authentication { .. } | Self::SshAuthentication { .. } => true,
            Self::Retrieval { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if the peer could not be reached at all.
    pub fn is_connect_failure(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            Self::Ssh(russh::Error::IO(_)) => true,
            _ => false,
        }
    }

    /// Returns `true` if the operation ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_401_counts_as_auth_failure() {
        let err = Error::Retrieval {
            status: 401,
            message: "unauthorized".into(),
        };
        assert!(err.is_auth_failure());

        let err = Error::Retrieval {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn timeout_is_reported() {
        assert!(Error::Timeout(Duration::from_secs(5)).is_timeout());
        assert!(!Error::MissingField { field: "x".into() }.is_timeout());
    }
}
