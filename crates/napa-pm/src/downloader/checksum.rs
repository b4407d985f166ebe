//! Checksum helpers for downloaded archives.
//!
//! The registry publishes a SHA-1 digest (`dist.shasum`) for every tarball.

use sha1::{Digest, Sha1};

/// Compare a computed digest against the registry-supplied one.
pub fn digests_match(computed: &str, expected: &str) -> bool {
    computed.eq_ignore_ascii_case(expected)
}

/// One-shot SHA-1 over a byte slice, as lowercase hex.
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
