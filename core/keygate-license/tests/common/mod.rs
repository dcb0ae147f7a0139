//! Shared test helpers for license catalog tests.

#![allow(dead_code)]

use std::sync::Arc;

use keygate_license::{
    CatalogAdmin, CreateRequest, IpRequest, IssuedLicense, KeyRequest, RecordStore,
    SharedSecret, ValidationEngine,
};
use tempfile::TempDir;

pub const SECRET: &str = "test-admin-secret";

/// A store in a private temp directory plus both front ends over it.
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<RecordStore>,
    pub admin: CatalogAdmin,
    pub engine: ValidationEngine,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
    let admin = CatalogAdmin::new(store.clone(), Arc::new(SharedSecret::new(SECRET)));
    let engine = ValidationEngine::new(store.clone());
    Fixture {
        dir,
        store,
        admin,
        engine,
    }
}

pub fn create_req(name: &str, days: i64) -> CreateRequest {
    CreateRequest {
        name: Some(name.to_string()),
        expire: Some(days),
    }
}

pub fn ip_req(lic: &str, ip: &str) -> IpRequest {
    IpRequest {
        lic: Some(lic.to_string()),
        ip: Some(ip.to_string()),
    }
}

pub fn key_req(lic: &str) -> KeyRequest {
    KeyRequest {
        lic: Some(lic.to_string()),
    }
}

impl Fixture {
    /// Creates a license as admin and returns it.
    pub fn create(&self, name: &str, days: i64) -> IssuedLicense {
        self.admin.create(Some(SECRET), &create_req(name, days)).unwrap()
    }

    pub fn add_ip(&self, lic: &str, ip: &str) {
        self.admin.add_ip(Some(SECRET), &ip_req(lic, ip)).unwrap();
    }
}
