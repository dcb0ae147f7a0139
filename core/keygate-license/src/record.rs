//! License records and their outward rendering.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Maximum number of addresses on a license allowlist.
pub const MAX_IPS_PER_LICENSE: usize = 2;

/// Seconds in one day, used to convert `expire` day counts.
pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// The persisted catalog: license key to record, ordered by key.
pub type Catalog = BTreeMap<String, LicenseRecord>;

/// A single issued license as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Human-readable owner label, unique within the catalog.
    pub name: String,
    /// Addresses allowed to use the license, in insertion order.
    ///
    /// Kept as strings so catalogs holding entries the current parser
    /// rejects (e.g. `010.0.0.1`) still load; such entries never match.
    pub ip_list: Vec<String>,
    /// Expiry instant in seconds since the Unix epoch.
    pub expire: i64,
}

impl LicenseRecord {
    /// Creates a record with an empty allowlist.
    #[must_use]
    pub fn new(name: impl Into<String>, expire: i64) -> Self {
        Self {
            name: name.into(),
            ip_list: Vec::new(),
            expire,
        }
    }

    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expire
    }

    /// Returns true if `ip` is on the allowlist.
    #[must_use]
    pub fn allows(&self, ip: Ipv4Addr) -> bool {
        self.ip_list.iter().any(|entry| parse_ipv4(entry) == Some(ip))
    }

    /// Number of addresses that can still be added.
    #[must_use]
    pub fn remaining_slots(&self) -> usize {
        MAX_IPS_PER_LICENSE.saturating_sub(self.ip_list.len())
    }

    /// Renders the record for a response, with `expire` as a calendar date.
    #[must_use]
    pub fn view(&self) -> LicenseView {
        LicenseView {
            name: self.name.clone(),
            ip_list: self.ip_list.clone(),
            expire: format_expire(self.expire),
        }
    }
}

/// A record as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseView {
    pub name: String,
    pub ip_list: Vec<String>,
    /// Expiry date, `YYYY-MM-DD` (UTC).
    pub expire: String,
}

/// A newly created license together with its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedLicense {
    pub license: String,
    #[serde(flatten)]
    pub record: LicenseView,
}

/// Parses a dotted-quad IPv4 address.
///
/// Each of the four segments must be a decimal integer in `0..=255` with no
/// leading zeros, sign, or surrounding whitespace.
#[must_use]
pub fn parse_ipv4(ip: &str) -> Option<Ipv4Addr> {
    Ipv4Addr::from_str(ip).ok()
}

/// Formats an epoch timestamp as `YYYY-MM-DD` in UTC.
#[must_use]
pub fn format_expire(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let record = LicenseRecord::new("acme", 1_000);
        assert!(!record.is_expired_at(999));
        assert!(record.is_expired_at(1_000));
    }

    #[test]
    fn unparseable_entries_never_match() {
        let mut record = LicenseRecord::new("legacy", 0);
        record.ip_list.push("010.0.0.1".to_string());
        assert!(!record.allows(Ipv4Addr::new(10, 0, 0, 1)));
        record.ip_list.push("10.0.0.1".to_string());
        assert!(record.allows(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn out_of_range_timestamp_falls_back_to_number() {
        assert_eq!(format_expire(i64::MAX), i64::MAX.to_string());
    }
}
