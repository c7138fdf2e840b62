//! Device inventory command handlers.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use tabled::Tabled;
use tracing::{debug, info, warn};

use netprobe_api::manager::models::{DEVICE_MODEL, REACHABILITY, SITE_ID, SYSTEM_IP};
use netprobe_api::{DeviceCollection, DeviceRecord, ManagerClient};
use netprobe_config::ManagerSettings;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Host")]
    host_name: String,
    #[tabled(rename = "Device ID")]
    device_id: String,
    #[tabled(rename = "Reachability")]
    reachability: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "System IP")]
    system_ip: String,
    #[tabled(rename = "Site")]
    site_id: String,
}

impl DeviceRow {
    /// Host name and device id are required; the rest render empty when absent.
    fn from_record(record: &DeviceRecord, color: bool) -> Result<Self, netprobe_api::Error> {
        let reachability = record.text_or_empty(REACHABILITY);
        let reachability = match (color, reachability.as_str()) {
            (true, "reachable") => reachability.green().to_string(),
            (true, "unreachable") => reachability.red().to_string(),
            _ => reachability,
        };
        Ok(Self {
            host_name: record.host_name()?,
            device_id: record.device_id()?,
            reachability,
            model: record.text_or_empty(DEVICE_MODEL),
            system_ip: record.text_or_empty(SYSTEM_IP),
            site_id: record.text_or_empty(SITE_ID),
        })
    }
}

// ── Plain output ────────────────────────────────────────────────────

/// Write one summary line per device, stopping at the first bad record.
///
/// Lines already written stay written. Returns the number of lines.
fn write_summary<W: Write>(
    devices: DeviceCollection,
    with_reachability: bool,
    target: &str,
    out: &mut W,
) -> Result<usize, CliError> {
    let mut written = 0;
    for line in devices.into_summary_lines(with_reachability) {
        let line = line.map_err(|e| CliError::from_api(e, target))?;
        writeln!(out, "{line}")?;
        written += 1;
    }
    Ok(written)
}

// ── Session ─────────────────────────────────────────────────────────

/// Log in, fetch the inventory, log out.
///
/// Logout is best effort: a failure there is logged, never returned.
async fn fetch_devices(settings: &ManagerSettings) -> Result<DeviceCollection, CliError> {
    let target = settings.url.as_str();
    let client = ManagerClient::new(settings.url.clone(), &settings.transport)
        .map_err(|e| CliError::from_api(e, target))?;

    client
        .login(&settings.username, &settings.password)
        .await
        .map_err(|e| CliError::from_api(e, target))?;
    info!(manager = target, "logged in");

    let result = client.list_devices().await;

    if let Err(e) = client.logout().await {
        warn!(error = %e, "logout failed");
    }

    let devices = result.map_err(|e| CliError::from_api(e, target))?;
    debug!(count = devices.len(), "fetched device inventory");
    Ok(devices)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: DevicesArgs,
    settings: &ManagerSettings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { reachability } => {
            let devices = fetch_devices(settings).await?;
            let target = settings.url.as_str();

            match global.output_format() {
                OutputFormat::Plain => {
                    if global.quiet {
                        write_summary(devices, reachability, target, &mut io::sink())?;
                    } else {
                        let mut stdout = io::stdout().lock();
                        write_summary(devices, reachability, target, &mut stdout)?;
                        stdout.flush()?;
                    }
                }
                OutputFormat::Table => {
                    let color = output::should_color(&global.color_mode());
                    let rows = devices
                        .iter()
                        .map(|d| DeviceRow::from_record(d, color))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| CliError::from_api(e, target))?;
                    output::print_output(&output::render_table(&rows), global.quiet);
                }
                ref format => {
                    if let Some(out) = output::render_structured(format, &devices.data) {
                        output::print_output(&out, global.quiet);
                    }
                }
            }
            Ok(())
        }
    }
}
