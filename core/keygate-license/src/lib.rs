//! License issuance and validation for Keygate.
//!
//! This crate handles:
//! - Generating 32-character license keys over `A-Z0-9`
//! - Persisting the license catalog as one JSON document with atomic commits
//! - Validating a key for a client address, deleting it lazily once expired
//! - Admin operations: create, add/clear allowlisted IPs, delete, list
//!
//! # Catalog Format
//!
//! The catalog file is a JSON object keyed by license key:
//!
//! ```json
//! { "ABC...": { "name": "acme", "ip_list": ["1.2.3.4"], "expire": 1767225600 } }
//! ```
//!
//! `expire` is stored as seconds since epoch and rendered as `YYYY-MM-DD`
//! in responses.
//!
//! # Concurrency
//!
//! All reads and writes go through [`RecordStore::transaction`], so
//! concurrent checks and admin edits never interleave a load and a save.

mod admin;
#[cfg(feature = "online")]
mod client;
mod error;
mod key;
mod record;
mod store;
mod validation;

pub use admin::{
    AdminAuthorizer, CatalogAdmin, ClearOutcome, CreateRequest, IpRequest, KeyRequest,
    SharedSecret,
};
pub use error::{ErrorKind, LicenseError, LicenseResult};
pub use key::{generate_key, is_valid_key_format, KEY_ALPHABET, LICENSE_KEY_LEN};
pub use record::{
    format_expire, parse_ipv4, Catalog, IssuedLicense, LicenseRecord, LicenseView,
    MAX_IPS_PER_LICENSE, SECS_PER_DAY,
};
pub use store::RecordStore;
pub use validation::{CheckRequest, ValidationEngine};

#[cfg(feature = "online")]
pub use client::LicenseClient;
