//! Cryptographic utilities
//!
//! Security-critical primitives shared by the token and refresh modules.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time byte slice comparison.
///
/// The comparison time depends only on the length of the slices, not on
/// their contents. Returns `false` immediately if lengths differ (length
/// is not secret).
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// One-way digest of an opaque secret for storage.
///
/// SHA-256, hex-encoded. The original secret cannot be recovered from
/// the digest; only the digest is ever persisted or compared.
pub fn digest_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
