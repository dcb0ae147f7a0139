//! Administrator operations on the license catalog.
//!
//! Every operation takes the caller's credential and checks it with the
//! configured [`AdminAuthorizer`] before touching the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{LicenseError, LicenseResult};
use crate::key::generate_key;
use crate::record::{
    parse_ipv4, IssuedLicense, LicenseRecord, LicenseView, MAX_IPS_PER_LICENSE, SECS_PER_DAY,
};
use crate::store::RecordStore;
use crate::validation::required;

/// Upper bound on key re-rolls when a generated key is already taken.
const MAX_KEY_ATTEMPTS: usize = 16;

/// Decides whether a credential grants admin access.
pub trait AdminAuthorizer: Send + Sync {
    fn authorize(&self, credential: Option<&str>) -> bool;
}

/// Authorizes callers presenting one shared secret.
///
/// Comparison is constant-time. An empty secret authorizes nobody.
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl AdminAuthorizer for SharedSecret {
    fn authorize(&self, credential: Option<&str>) -> bool {
        match credential {
            Some(given) if !self.secret.is_empty() => {
                bool::from(given.as_bytes().ct_eq(self.secret.as_bytes()))
            }
            _ => false,
        }
    }
}

/// Parameters for [`CatalogAdmin::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: Option<String>,
    /// Lifetime in days; may be negative.
    pub expire: Option<i64>,
}

/// Parameters for [`CatalogAdmin::add_ip`].
#[derive(Debug, Clone, Default)]
pub struct IpRequest {
    pub lic: Option<String>,
    pub ip: Option<String>,
}

/// Parameters for operations addressing a single license.
#[derive(Debug, Clone, Default)]
pub struct KeyRequest {
    pub lic: Option<String>,
}

/// Result of [`CatalogAdmin::clear_ips`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The full allowlist was emptied.
    Cleared,
    /// The list was not full and was left alone.
    NotFull { remaining: usize },
}

impl ClearOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Cleared => "IP list cleared successfully".to_string(),
            Self::NotFull { remaining } => format!(
                "There are still {remaining} IPs that can be added. No need to clear IP list."
            ),
        }
    }
}

/// Creates, edits, and removes licenses.
#[derive(Clone)]
pub struct CatalogAdmin {
    store: Arc<RecordStore>,
    authorizer: Arc<dyn AdminAuthorizer>,
}

impl CatalogAdmin {
    pub fn new(store: Arc<RecordStore>, authorizer: Arc<dyn AdminAuthorizer>) -> Self {
        Self { store, authorizer }
    }

    fn authorize(&self, credential: Option<&str>) -> LicenseResult<()> {
        if self.authorizer.authorize(credential) {
            Ok(())
        } else {
            warn!("rejected admin credential");
            Err(LicenseError::Unauthorized)
        }
    }

    /// Issues a new license valid for `expire` days from now.
    pub fn create(&self, credential: Option<&str>, req: &CreateRequest) -> LicenseResult<IssuedLicense> {
        self.create_at(credential, req, chrono::Utc::now().timestamp())
    }

    /// Issues a new license valid for `expire` days from `now`.
    ///
    /// An `expire` of zero counts as missing.
    pub fn create_at(
        &self,
        credential: Option<&str>,
        req: &CreateRequest,
        now: i64,
    ) -> LicenseResult<IssuedLicense> {
        self.authorize(credential)?;
        let name = required(req.name.as_deref())?;
        let days = req
            .expire
            .filter(|days| *days != 0)
            .ok_or(LicenseError::MissingParameter)?;
        let expire = days
            .checked_mul(SECS_PER_DAY)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(LicenseError::InvalidExpire)?;

        self.store.transaction(|catalog| {
            if catalog.values().any(|record| record.name == name) {
                return Err(LicenseError::NameExists);
            }

            let key = (0..MAX_KEY_ATTEMPTS)
                .map(|_| generate_key(name))
                .find(|key| !catalog.contains_key(key))
                .ok_or_else(|| LicenseError::Storage("could not allocate a unique key".to_string()))?;

            let record = LicenseRecord::new(name, expire);
            let view = record.view();
            catalog.insert(key.clone(), record);
            info!(%name, days, "license created");

            Ok(IssuedLicense {
                license: key,
                record: view,
            })
        })?
    }

    /// Adds an address to a license allowlist.
    pub fn add_ip(&self, credential: Option<&str>, req: &IpRequest) -> LicenseResult<()> {
        self.authorize(credential)?;
        let lic = required(req.lic.as_deref())?;
        let ip = required(req.ip.as_deref())?;
        let ip = parse_ipv4(ip).ok_or(LicenseError::InvalidIpFormat)?;

        self.store.transaction(|catalog| {
            let record = catalog.get_mut(lic).ok_or(LicenseError::NotFound)?;
            if record.ip_list.len() >= MAX_IPS_PER_LICENSE {
                return Err(LicenseError::CapacityExceeded);
            }
            if record.allows(ip) {
                return Err(LicenseError::IpExists);
            }
            record.ip_list.push(ip.to_string());
            info!(name = %record.name, %ip, "address added");
            Ok(())
        })?
    }

    /// Empties a license allowlist, but only once it is full.
    pub fn clear_ips(&self, credential: Option<&str>, req: &KeyRequest) -> LicenseResult<ClearOutcome> {
        self.authorize(credential)?;
        let lic = required(req.lic.as_deref())?;

        self.store.transaction(|catalog| {
            let record = catalog.get_mut(lic).ok_or(LicenseError::NotFound)?;
            if record.ip_list.len() >= MAX_IPS_PER_LICENSE {
                record.ip_list.clear();
                info!(name = %record.name, "allowlist cleared");
                Ok(ClearOutcome::Cleared)
            } else {
                Ok(ClearOutcome::NotFull {
                    remaining: record.remaining_slots(),
                })
            }
        })?
    }

    /// Removes a license.
    pub fn delete(&self, credential: Option<&str>, req: &KeyRequest) -> LicenseResult<()> {
        self.authorize(credential)?;
        let lic = required(req.lic.as_deref())?;

        self.store.transaction(|catalog| {
            let record = catalog.remove(lic).ok_or(LicenseError::NotFound)?;
            info!(name = %record.name, "license deleted");
            Ok(())
        })?
    }

    /// Returns every license, keyed by license key.
    pub fn list_all(&self, credential: Option<&str>) -> LicenseResult<BTreeMap<String, LicenseView>> {
        self.authorize(credential)?;
        let catalog = self.store.load()?;
        Ok(catalog
            .iter()
            .map(|(key, record)| (key.clone(), record.view()))
            .collect())
    }
}

impl std::fmt::Debug for CatalogAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogAdmin")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
