//! Error types for the license catalog.
//!
//! Display strings are the messages returned to HTTP clients, so they are
//! kept stable across releases.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Admin credential missing or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required request field was absent or empty.
    #[error("Missing parameters")]
    MissingParameter,

    /// License key is not 32 characters from `A-Z0-9`.
    #[error("Invalid license format")]
    InvalidKeyFormat,

    /// Address is not a dotted-quad IPv4 address.
    #[error("Invalid IP format")]
    InvalidIpFormat,

    /// Lifetime in days does not fit the timestamp range.
    #[error("Invalid expire value")]
    InvalidExpire,

    /// No record exists for the key.
    #[error("License not found")]
    NotFound,

    /// The caller's address is not on the license allowlist.
    #[error("IP not allowed")]
    IpNotAllowed,

    /// License expired; the record was removed as part of the check.
    #[error("License expired and has been removed")]
    Expired,

    /// Another license already uses this name.
    #[error("Name already exists")]
    NameExists,

    /// The address is already on the allowlist.
    #[error("IP already exists in the list")]
    IpExists,

    /// The allowlist already holds the maximum number of addresses.
    #[error("IP list is full")]
    CapacityExceeded,

    /// Network error talking to a remote license server.
    #[cfg(feature = "online")]
    #[error("network error: {0}")]
    Network(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error on the catalog file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    MissingParameter,
    InvalidFormat,
    NotFound,
    IpNotAllowed,
    Expired,
    Conflict,
    CapacityExceeded,
    Internal,
}

impl LicenseError {
    /// Returns the error's kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::MissingParameter => ErrorKind::MissingParameter,
            Self::InvalidKeyFormat | Self::InvalidIpFormat | Self::InvalidExpire => {
                ErrorKind::InvalidFormat
            }
            Self::NotFound => ErrorKind::NotFound,
            Self::IpNotAllowed => ErrorKind::IpNotAllowed,
            Self::Expired => ErrorKind::Expired,
            Self::NameExists | Self::IpExists => ErrorKind::Conflict,
            Self::CapacityExceeded => ErrorKind::CapacityExceeded,
            #[cfg(feature = "online")]
            Self::Network(_) => ErrorKind::Internal,
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
