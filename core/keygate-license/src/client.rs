//! HTTP client for protected software checking its license remotely.

use serde::Deserialize;

use crate::error::{ErrorKind, LicenseError, LicenseResult};
use crate::record::LicenseView;
use crate::validation::CheckRequest;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: Option<ErrorKind>,
}

/// Calls a remote `/check-license` endpoint.
#[derive(Debug, Clone)]
pub struct LicenseClient {
    endpoint: String,
    http: reqwest::Client,
}

impl LicenseClient {
    /// `endpoint` is the full check URL, e.g. `http://host:8000/check-license`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Checks `lic` for the given client address.
    pub async fn check(&self, lic: &str, ip: &str) -> LicenseResult<LicenseView> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&CheckRequest::new(lic, ip))
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        if resp.status().is_success() {
            return resp
                .json::<LicenseView>()
                .await
                .map_err(|e| LicenseError::Network(format!("invalid response: {e}")));
        }

        let status = resp.status();
        match resp.json::<ErrorBody>().await {
            Ok(body) => Err(error_from_body(body)),
            Err(_) => Err(LicenseError::Network(format!("unexpected status {status}"))),
        }
    }
}

fn error_from_body(body: ErrorBody) -> LicenseError {
    let is = |err: LicenseError| body.error == err.to_string();
    match body.kind {
        Some(ErrorKind::Unauthorized) => LicenseError::Unauthorized,
        Some(ErrorKind::MissingParameter) => LicenseError::MissingParameter,
        Some(ErrorKind::InvalidFormat) if is(LicenseError::InvalidKeyFormat) => {
            LicenseError::InvalidKeyFormat
        }
        Some(ErrorKind::InvalidFormat) if is(LicenseError::InvalidIpFormat) => {
            LicenseError::InvalidIpFormat
        }
        Some(ErrorKind::InvalidFormat) if is(LicenseError::InvalidExpire) => {
            LicenseError::InvalidExpire
        }
        Some(ErrorKind::NotFound) => LicenseError::NotFound,
        Some(ErrorKind::IpNotAllowed) => LicenseError::IpNotAllowed,
        Some(ErrorKind::Expired) => LicenseError::Expired,
        Some(ErrorKind::CapacityExceeded) => LicenseError::CapacityExceeded,
        Some(ErrorKind::Conflict) if is(LicenseError::NameExists) => LicenseError::NameExists,
        Some(ErrorKind::Conflict) if is(LicenseError::IpExists) => LicenseError::IpExists,
        _ => LicenseError::Network(body.error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error: &str, kind: Option<ErrorKind>) -> ErrorBody {
        ErrorBody {
            error: error.to_string(),
            kind,
        }
    }

    #[test]
    fn maps_known_kinds() {
        assert!(matches!(
            error_from_body(body("IP not allowed", Some(ErrorKind::IpNotAllowed))),
            LicenseError::IpNotAllowed
        ));
        assert!(matches!(
            error_from_body(body("Invalid IP format", Some(ErrorKind::InvalidFormat))),
            LicenseError::InvalidIpFormat
        ));
    }

    #[test]
    fn variants_resolved_by_exact_message() {
        assert!(matches!(
            error_from_body(body("Invalid license format", Some(ErrorKind::InvalidFormat))),
            LicenseError::InvalidKeyFormat
        ));
        assert!(matches!(
            error_from_body(body("Name already exists", Some(ErrorKind::Conflict))),
            LicenseError::NameExists
        ));
        assert!(matches!(
            error_from_body(body("IP already exists in the list", Some(ErrorKind::Conflict))),
            LicenseError::IpExists
        ));
    }

    #[test]
    fn unrecognized_message_is_not_guessed() {
        match error_from_body(body("Invalid IP address given", Some(ErrorKind::InvalidFormat))) {
            LicenseError::Network(msg) => assert_eq!(msg, "Invalid IP address given"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_kind_keeps_message() {
        match error_from_body(body("boom", None)) {
            LicenseError::Network(msg) => assert_eq!(msg, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
