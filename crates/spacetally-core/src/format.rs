//! Presentation values derived from node totals.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Above this many bytes a node is at least at warning level (1 TiB).
pub const WARNING_MARK: u64 = 1 << 40;

/// Above this many bytes a node is at alarm level (3 TiB).
pub const ALARM_MARK: u64 = 3 << 40;

/// Below this many bytes the GiB column shows [`BELOW_THRESHOLD_MARKER`].
pub const GIB_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Shown instead of a GiB figure for tiny totals.
pub const BELOW_THRESHOLD_MARKER: &str = "<0.001";

/// Shown instead of a date that was never observed.
pub const MISSING_DATE: &str = "-";

const SIZE_UNITS: [&str; 7] = ["", "k", "M", "G", "T", "P", "E"];

/// Three-tier classification of a total size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlarmLevel {
    Normal,
    Warning,
    Alarm,
}

impl AlarmLevel {
    /// Classify a size in bytes.
    pub fn classify(size: u64) -> Self {
        if size <= WARNING_MARK {
            AlarmLevel::Normal
        } else if size > ALARM_MARK {
            AlarmLevel::Alarm
        } else {
            AlarmLevel::Warning
        }
    }
}

/// Format bytes with a binary prefix and two decimals, e.g. `1.50kB`.
pub fn human_readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut idx = 0;

    while idx + 1 < SIZE_UNITS.len() && size / 1024.0 >= 1.0 {
        size /= 1024.0;
        idx += 1;
    }

    format!("{size:.2}{}B", SIZE_UNITS[idx])
}

/// Format bytes as GiB with two decimals, or the below-threshold marker.
pub fn gib_size(bytes: u64) -> String {
    if bytes < GIB_THRESHOLD {
        BELOW_THRESHOLD_MARKER.to_string()
    } else {
        format!("{:.2}", bytes as f64 / (1u64 << 30) as f64)
    }
}

/// Format epoch seconds as a UTC `YYYY-MM-DD` date.
pub fn format_date(secs: Option<i64>) -> String {
    secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING_DATE.to_string())
}
