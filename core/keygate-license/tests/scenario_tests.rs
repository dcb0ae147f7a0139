//! End-to-end flows across admin and validation.

mod common;

use common::{create_req, fixture, key_req, SECRET};
use keygate_license::{format_expire, CheckRequest, ClearOutcome, LicenseError, SECS_PER_DAY};

#[test]
fn fresh_license_rejects_every_ip() {
    let fx = fixture();
    let now = 1_700_000_000;
    let issued = fx.admin.create_at(Some(SECRET), &create_req("acme", 30), now).unwrap();
    assert!(issued.record.ip_list.is_empty());
    assert_eq!(issued.record.expire, format_expire(now + 30 * SECS_PER_DAY));

    let err = fx
        .engine
        .check_at(&CheckRequest::new(&issued.license, "1.2.3.4"), now)
        .unwrap_err();
    assert!(matches!(err, LicenseError::IpNotAllowed));
}

#[test]
fn allowlisted_ip_passes_check() {
    let fx = fixture();
    let issued = fx.create("acme", 30);
    fx.add_ip(&issued.license, "1.2.3.4");

    let view = fx.engine.check(&CheckRequest::new(&issued.license, "1.2.3.4")).unwrap();
    assert_eq!(view.name, "acme");
    assert_eq!(view.expire.len(), "YYYY-MM-DD".len());
    assert_eq!(view.expire, issued.record.expire);
}

#[test]
fn full_list_cleared_then_old_ips_rejected() {
    let fx = fixture();
    let issued = fx.create("acme", 30);
    fx.add_ip(&issued.license, "1.1.1.1");
    fx.add_ip(&issued.license, "2.2.2.2");
    assert!(matches!(
        fx.admin.add_ip(Some(SECRET), &common::ip_req(&issued.license, "3.3.3.3")),
        Err(LicenseError::CapacityExceeded)
    ));

    assert_eq!(
        fx.admin.clear_ips(Some(SECRET), &key_req(&issued.license)).unwrap(),
        ClearOutcome::Cleared
    );
    for ip in ["1.1.1.1", "2.2.2.2"] {
        let err = fx.engine.check(&CheckRequest::new(&issued.license, ip)).unwrap_err();
        assert!(matches!(err, LicenseError::IpNotAllowed));
    }
}

#[test]
fn negative_lifetime_expires_on_first_check() {
    let fx = fixture();
    let issued = fx.create("acme", -1);
    fx.add_ip(&issued.license, "1.2.3.4");

    let req = CheckRequest::new(&issued.license, "1.2.3.4");
    assert!(matches!(fx.engine.check(&req), Err(LicenseError::Expired)));
    assert!(!fx.admin.list_all(Some(SECRET)).unwrap().contains_key(&issued.license));
    assert!(matches!(fx.engine.check(&req), Err(LicenseError::NotFound)));
}

#[test]
fn short_key_is_format_error() {
    let fx = fixture();
    let err = fx.engine.check(&CheckRequest::new("short", "1.2.3.4")).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidKeyFormat));
}

#[test]
fn catalog_survives_reopen() {
    let fx = fixture();
    let issued = fx.create("acme", 30);
    fx.add_ip(&issued.license, "1.2.3.4");

    let reopened = std::sync::Arc::new(keygate_license::RecordStore::open(fx.store.path()));
    let engine = keygate_license::ValidationEngine::new(reopened);
    assert!(engine.check(&CheckRequest::new(&issued.license, "1.2.3.4")).is_ok());
}
