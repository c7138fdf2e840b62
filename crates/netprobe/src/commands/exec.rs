//! One-shot SSH command handler.

use tracing::{debug, info};

use netprobe_api::SshConfig;

use crate::cli::{ExecArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(serde::Serialize)]
struct ExecResult<'a> {
    target: String,
    device_type: &'static str,
    command: &'a str,
    output: &'a str,
    exit_status: Option<u32>,
}

pub async fn handle(args: &ExecArgs, ssh: &SshConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let target = ssh.socket_addr();
    info!(peer = %target, device_type = %ssh.device_type, command = %args.command, "running command");

    let result = netprobe_api::run_command(ssh, &args.command)
        .await
        .map_err(|e| CliError::from_api(e, &target))?;
    debug!(exit_status = ?result.exit_status, bytes = result.text.len(), "command finished");

    let rendered = match global.output_format() {
        OutputFormat::Plain | OutputFormat::Table => result.text.clone(),
        ref format => {
            let record = ExecResult {
                target,
                device_type: ssh.device_type.into(),
                command: &args.command,
                output: &result.text,
                exit_status: result.exit_status,
            };
            output::render_structured(format, &record).unwrap_or_default()
        }
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
