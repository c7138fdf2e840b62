//! Command handlers: bridge CLI args to the manager client and SSH runner.

pub mod config_cmd;
pub mod devices;
pub mod exec;
