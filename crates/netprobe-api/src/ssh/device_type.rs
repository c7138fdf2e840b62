//! Device-type profiles for the SSH command runner.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Platform profile of the target device, named the way netmiko names them.
///
/// The profile decides how raw command output is cleaned up before it is
/// handed back.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceType {
    /// Cisco IOS-XR
    #[default]
    CiscoXr,
    /// Cisco IOS / IOS-XE
    CiscoIos,
    /// Cisco NX-OS
    CiscoNxos,
    /// Arista EOS
    AristaEos,
    /// Juniper Junos
    JuniperJunos,
    /// Generic Linux host
    Linux,
}

impl DeviceType {
    pub fn default_port(self) -> u16 {
        22
    }

    /// Clean up raw exec output for display.
    ///
    /// All profiles convert CRLF to LF and trim trailing whitespace. IOS-XR
    /// prefixes every command's output with a timestamp line, which is dropped.
    pub fn normalize_output(self, raw: &str) -> String {
        let text = raw.replace("\r\n", "\n").replace('\r', "");
        let text = match self {
            Self::CiscoXr => strip_xr_timestamp(&text),
            _ => text.as_str(),
        };
        text.trim_end().to_owned()
    }
}

/// Drop a leading `Mon Oct 19 10:11:12.123 UTC` line, plus blank lines around it.
fn strip_xr_timestamp(text: &str) -> &str {
    let body = text.trim_start_matches('\n');
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
    if is_xr_timestamp(first) {
        rest.trim_start_matches('\n')
    } else {
        text
    }
}

fn is_xr_timestamp(line: &str) -> bool {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [day, month, date, time, _zone] = parts.as_slice() else {
        return false;
    };
    DAYS.contains(day)
        && MONTHS.contains(month)
        && date.chars().all(|c| c.is_ascii_digit())
        && time.contains(':')
}
