//! Network status collaborator

use std::collections::BTreeMap;

use super::media::CollaboratorError;

/// Wireless association report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkReport {
    /// Raw human-readable status text
    pub raw: String,
    /// Parsed `key=value` fields
    pub fields: BTreeMap<String, String>,
}

impl NetworkReport {
    /// Build a report from raw `key=value` status text
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let fields = parse_key_values(&raw);
        Self { raw, fields }
    }

    /// SSID of the associated network, if any
    pub fn ssid(&self) -> Option<&str> {
        self.fields.get("ssid").map(String::as_str)
    }

    /// Supplicant association state, e.g. "SCANNING"
    pub fn wpa_state(&self) -> Option<&str> {
        self.fields.get("wpa_state").map(String::as_str)
    }

    /// One-line summary for the status row
    pub fn summary(&self) -> Option<String> {
        if let Some(ssid) = self.ssid() {
            Some(format!("Wifi: {ssid}"))
        } else {
            self.wpa_state().map(str::to_owned)
        }
    }
}

/// Operations consumed from the network status collaborator
pub trait NetworkStatus {
    fn status(&self) -> Result<NetworkReport, CollaboratorError>;
}

/// Parse `key=value` lines; lines without `=` are skipped
///
/// Only the first `=` separates key from value, so values may contain `=`.
pub fn parse_key_values(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_owned(), value.trim_end().to_owned()))
        .collect()
}
