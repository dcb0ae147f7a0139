//! License key generation and format checks.
//!
//! Keys are 32 characters drawn uniformly from `A-Z0-9`. The seed (usually
//! the license name) is hashed together with OS entropy to seed the RNG, so
//! it contributes entropy but never determines the key. Uniqueness is the
//! caller's job: [`crate::CatalogAdmin`] re-rolls on collision.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};

/// Length of every license key.
pub const LICENSE_KEY_LEN: usize = 32;

/// Characters a license key may contain.
pub const KEY_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a fresh license key.
#[must_use]
pub fn generate_key(seed: &str) -> String {
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(entropy);
    let mut rng = StdRng::from_seed(hasher.finalize().into());

    (0..LICENSE_KEY_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// Returns true if `key` has the canonical license key shape.
#[must_use]
pub fn is_valid_key_format(key: &str) -> bool {
    key.len() == LICENSE_KEY_LEN && key.bytes().all(|b| KEY_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_different_keys() {
        assert_ne!(generate_key("acme"), generate_key("acme"));
    }

    #[test]
    fn lowercase_rejected() {
        assert!(!is_valid_key_format(&"a".repeat(LICENSE_KEY_LEN)));
        assert!(is_valid_key_format(&"A".repeat(LICENSE_KEY_LEN)));
    }
}
