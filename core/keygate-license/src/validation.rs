//! Client-facing license checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LicenseError, LicenseResult};
use crate::key::is_valid_key_format;
use crate::record::{parse_ipv4, LicenseView};
use crate::store::RecordStore;

/// Body of a license check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    pub lic: Option<String>,
    pub ip: Option<String>,
}

impl CheckRequest {
    pub fn new(lic: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            lic: Some(lic.into()),
            ip: Some(ip.into()),
        }
    }
}

/// Validates license keys presented by protected software.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    store: Arc<RecordStore>,
}

impl ValidationEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Checks a key against the catalog at the current time.
    pub fn check(&self, req: &CheckRequest) -> LicenseResult<LicenseView> {
        self.check_at(req, chrono::Utc::now().timestamp())
    }

    /// Checks a key against the catalog as of `now` (seconds since epoch).
    ///
    /// Input is validated before the catalog is read. An expired record is
    /// deleted in the same transaction that reports [`LicenseError::Expired`].
    pub fn check_at(&self, req: &CheckRequest, now: i64) -> LicenseResult<LicenseView> {
        let lic = required(req.lic.as_deref())?;
        let ip = required(req.ip.as_deref())?;

        if !is_valid_key_format(lic) {
            return Err(LicenseError::InvalidKeyFormat);
        }
        let ip = parse_ipv4(ip).ok_or(LicenseError::InvalidIpFormat)?;

        self.store.transaction(|catalog| {
            let record = catalog.get(lic).ok_or(LicenseError::NotFound)?;
            if !record.allows(ip) {
                debug!(%ip, "address not on allowlist");
                return Err(LicenseError::IpNotAllowed);
            }
            if record.is_expired_at(now) {
                warn!(name = %record.name, "license expired, removing");
                catalog.remove(lic);
                return Err(LicenseError::Expired);
            }
            Ok(record.view())
        })?
    }
}

/// Treats absent and empty fields alike.
pub(crate) fn required(field: Option<&str>) -> LicenseResult<&str> {
    field
        .filter(|value| !value.is_empty())
        .ok_or(LicenseError::MissingParameter)
}
