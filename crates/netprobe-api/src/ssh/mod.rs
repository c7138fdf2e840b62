// One-shot SSH command runner
//
// Opens a connection to a single device, runs exactly one command on an
// exec channel, and returns its text. No prompt handling, no session reuse.

pub mod config;
pub mod device_type;
pub mod session;

pub use config::{HostKeyVerification, SshConfig};
pub use device_type::DeviceType;
pub use session::{CommandOutput, SshSession, run_command};
