// Manager API response types
//
// Device records are kept as raw JSON objects: the manager returns dozens of
// fields whose presence varies by device family and software release, and
// callers only ever read a handful of them. Strict accessors fail loudly on
// a missing key; `get` is there for callers that only want to look.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

pub const HOST_NAME: &str = "host-name";
pub const DEVICE_ID: &str = "deviceId";
pub const REACHABILITY: &str = "reachability";
pub const DEVICE_MODEL: &str = "device-model";
pub const SYSTEM_IP: &str = "system-ip";
pub const SITE_ID: &str = "site-id";

// ── Collection ───────────────────────────────────────────────────────

/// Body of `GET /dataservice/device`.
///
/// ```json
/// { "header": { ... }, "data": [ { "host-name": "vEdge-1", ... } ] }
/// ```
///
/// Only `data` is kept. A body without it is an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCollection {
    #[serde(default)]
    pub data: Vec<DeviceRecord>,
}

impl DeviceCollection {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceRecord> {
        self.data.iter()
    }

    /// Consume the collection into one printable line per record, in order.
    ///
    /// Lines are produced lazily. A record missing a required field yields
    /// `Err(Error::MissingField)` at its position; callers that stop at the
    /// first error never see later records.
    pub fn into_summary_lines(
        self,
        with_reachability: bool,
    ) -> impl Iterator<Item = Result<String, Error>> {
        self.data.into_iter().map(move |record| {
            if with_reachability {
                record.summary_with_reachability()
            } else {
                record.summary()
            }
        })
    }
}

impl IntoIterator for DeviceCollection {
    type Item = DeviceRecord;
    type IntoIter = std::vec::IntoIter<DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a DeviceCollection {
    type Item = &'a DeviceRecord;
    type IntoIter = std::slice::Iter<'a, DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

// ── Record ───────────────────────────────────────────────────────────

/// One device object, untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(pub Map<String, Value>);

impl DeviceRecord {
    /// Strict lookup. Missing keys are an error, never a default.
    pub fn field(&self, key: &str) -> Result<&Value, Error> {
        self.0.get(key).ok_or_else(|| Error::MissingField {
            field: key.to_owned(),
        })
    }

    /// Defensive lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Strict lookup rendered for display: strings bare, everything else as JSON.
    pub fn text(&self, key: &str) -> Result<String, Error> {
        self.field(key).map(display_value)
    }

    /// Defensive variant of [`text`](Self::text).
    pub fn text_or_empty(&self, key: &str) -> String {
        self.get(key).map(display_value).unwrap_or_default()
    }

    pub fn host_name(&self) -> Result<String, Error> {
        self.text(HOST_NAME)
    }

    pub fn device_id(&self) -> Result<String, Error> {
        self.text(DEVICE_ID)
    }

    pub fn reachability(&self) -> Result<String, Error> {
        self.text(REACHABILITY)
    }

    /// `"{host-name} ({deviceId})"`
    pub fn summary(&self) -> Result<String, Error> {
        Ok(format!("{} ({})", self.host_name()?, self.device_id()?))
    }

    /// `"{host-name} ({deviceId}) {reachability}"`
    pub fn summary_with_reachability(&self) -> Result<String, Error> {
        Ok(format!(
            "{} ({}) {}",
            self.host_name()?,
            self.device_id()?,
            self.reachability()?
        ))
    }
}

impl From<Map<String, Value>> for DeviceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
