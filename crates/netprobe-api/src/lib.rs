// netprobe-api: SD-WAN Manager session client and one-shot SSH runner

pub mod error;
pub mod manager;
pub mod ssh;
pub mod transport;

pub use error::Error;
pub use manager::{DeviceCollection, DeviceRecord, ManagerClient, SESSION_COOKIE};
pub use ssh::{CommandOutput, DeviceType, HostKeyVerification, SshConfig, run_command};
pub use transport::{TlsMode, TransportConfig};
