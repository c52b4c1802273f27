//! Raw WHOIS records and their normalization into [`WhoisInfo`]

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{WhoisInfo, UNKNOWN};

/// Output format of normalized dates
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y.%m.%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y/%m/%d"];

/// Registration data as reported by a resolver.
///
/// Registries may repeat date and status fields, so those are lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisRecord {
    pub registrar: Option<String>,
    #[serde(default)]
    pub creation_date: Vec<String>,
    #[serde(default)]
    pub expiration_date: Vec<String>,
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub text: String,
}

impl WhoisRecord {
    /// Normalize into the cached/wire representation
    pub fn into_info(self) -> WhoisInfo {
        let registrar = self
            .registrar
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        WhoisInfo {
            success: true,
            registrar: Some(registrar),
            creation_date: Some(format_date(&self.creation_date)),
            expiration_date: Some(format_date(&self.expiration_date)),
            status: Some(format_status(&self.status)),
            error: None,
        }
    }
}

/// Parse the date notations registries commonly use
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// First date of the list as `YYYY-MM-DD HH:MM:SS`.
///
/// Unparsable text is returned verbatim, an empty list becomes "Unknown".
pub fn format_date(values: &[String]) -> String {
    let Some(first) = values.iter().map(|v| v.trim()).find(|v| !v.is_empty()) else {
        return UNKNOWN.to_string();
    };

    match parse_date(first) {
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => first.to_string(),
    }
}

/// First status of the list with any trailing URL removed
pub fn format_status(values: &[String]) -> String {
    let Some(first) = values.first() else {
        return UNKNOWN.to_string();
    };

    let status = first.split("https://").next().unwrap_or_default().trim();
    let status = status.split("http://").next().unwrap_or_default().trim();
    if status.is_empty() {
        UNKNOWN.to_string()
    } else {
        status.to_string()
    }
}
