//! One-shot SSH command execution using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use russh::client::{self, Handle};
use russh::keys::PublicKey;
use russh::{ChannelMsg, Disconnect};
use secrecy::ExposeSecret;
use tracing::{debug, trace, warn};

use super::config::{HostKeyVerification, SshConfig};
use crate::error::Error;

/// Text a device produced for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Normalized stdout and stderr, in the order the device sent them.
    pub text: String,
    /// Exit status, if the device reported one.
    pub exit_status: Option<u32>,
}

/// Connect, authenticate, run `command`, disconnect.
///
/// The session is never reused: one call is one connection.
pub async fn run_command(config: &SshConfig, command: &str) -> Result<CommandOutput, Error> {
    let session = SshSession::connect(config).await?;
    let result = session.exec(command).await;
    session.close().await?;
    result
}

/// Authenticated SSH connection to one device.
pub struct SshSession {
    handle: Handle<SshHandler>,
    config: SshConfig,
}

impl SshSession {
    /// Connect to the device and authenticate with the configured password.
    ///
    /// Handshake and authentication share one `config.timeout` deadline.
    pub async fn connect(config: &SshConfig) -> Result<Self, Error> {
        tokio::time::timeout(config.timeout, Self::connect_inner(config))
            .await
            .map_err(|_| Error::Timeout(config.timeout))?
    }

    async fn connect_inner(config: &SshConfig) -> Result<Self, Error> {
        // Deadlines are enforced around connect and exec instead.
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: Arc::clone(&host_key_error),
        };

        debug!(
            host = %config.host,
            port = config.port,
            device_type = %config.device_type,
            "connecting"
        );

        let mut handle =
            client::connect(ssh_config, (config.host.as_str(), config.port), handler)
                .await
                .map_err(|e| take_host_key_error(&host_key_error).unwrap_or(Error::Ssh(e)))?;

        let auth = handle
            .authenticate_password(config.username.as_str(), config.password.expose_secret())
            .await?;

        if !auth.success() {
            return Err(Error::SshAuthentication {
                user: config.username.clone(),
            });
        }

        debug!(user = %config.username, "authenticated");
        Ok(Self {
            handle,
            config: config.clone(),
        })
    }

    /// Run one command on a fresh exec channel and collect its output.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput, Error> {
        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, self.exec_inner(command))
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    async fn exec_inner(&self, command: &str) -> Result<CommandOutput, Error> {
        let mut channel = self.handle.channel_open_session().await?;
        debug!(command, "sending command");
        channel.exec(true, command).await?;

        let mut raw = Vec::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => raw.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } => {
                    trace!(ext, bytes = data.len(), "extended data");
                    raw.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status: code } => {
                    debug!(code, "command exited");
                    exit_status = Some(code);
                }
                ChannelMsg::Eof => trace!("eof"),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let text = self
            .config
            .device_type
            .normalize_output(&String::from_utf8_lossy(&raw));
        Ok(CommandOutput { text, exit_status })
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), Error> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        debug!("disconnected");
        Ok(())
    }
}

fn take_host_key_error(slot: &Mutex<Option<Error>>) -> Option<Error> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// russh client handler: host key policy only.
struct SshHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key failure, surfaced by `connect` in place of the
    /// generic `russh::Error::UnknownKey`.
    host_key_error: Arc<Mutex<Option<Error>>>,
}

impl SshHandler {
    /// `Ok(true)` on match, `Ok(false)` if the host is unknown.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, Error> {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(Error::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(Error::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> Result<(), Error> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::known_hosts::learn_known_hosts_path(
                &self.host, self.port, pubkey, path,
            ),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };
        result.map_err(|e| Error::KnownHosts(e.to_string()))
    }

    fn reject(&self, err: Error) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let accepted = match self.verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("failed to save host key: {e}");
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(Error::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };
        Ok(accepted)
    }
}
