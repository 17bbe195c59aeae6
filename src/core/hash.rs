//! SHA-256 content hashing over canonical bytes.
//!
//! Hashes are stored and displayed as `sha256:<hex>`. Hashing is defined
//! only over canonical forms of validation-passing documents; callers must
//! validate first.

use crate::core::error::AttestError;
use sha2::{Digest, Sha256};

pub const HASH_PREFIX: &str = "sha256:";

/// Checksum value a generator writes before the document is sealed.
pub const PLACEHOLDER_CHECKSUM: &str = "sha256:REPLACE_AFTER_CANON";

/// SHA-256 of raw bytes, hex encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a canonical form into its stored representation.
pub fn prefixed_hash(canonical: &str) -> String {
    format!("{}{}", HASH_PREFIX, sha256_hex(canonical.as_bytes()))
}

/// Strip the `sha256:` prefix if present.
pub fn strip_hash_prefix(value: &str) -> &str {
    value.strip_prefix(HASH_PREFIX).unwrap_or(value)
}

/// True when the value is `sha256:` followed by 64 lowercase hex digits.
pub fn is_well_formed(value: &str) -> bool {
    match value.strip_prefix(HASH_PREFIX) {
        Some(hex_part) => {
            hex_part.len() == 64 && hex_part.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        }
        None => false,
    }
}

/// Decode a hash (with or without prefix) into the raw 32 digest bytes
/// used as the signing input.
pub fn digest_bytes(hash: &str) -> Result<[u8; 32], AttestError> {
    let hex_part = strip_hash_prefix(hash);
    let bytes = hex::decode(hex_part)
        .map_err(|e| AttestError::InvalidHash(format!("{}: {}", hash, e)))?;
    bytes
        .try_into()
        .map_err(|_| AttestError::InvalidHash(format!("expected 32 bytes: {}", hash)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha256_vector() {
        // SHA256("hello")
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn prefixed_hash_is_deterministic() {
        let a = prefixed_hash("canonical body\n");
        let b = prefixed_hash("canonical body\n");
        assert_eq!(a, b);
        assert!(a.starts_with(HASH_PREFIX));
        assert!(is_well_formed(&a));
    }

    #[test]
    fn well_formed_rejects_placeholder_and_junk() {
        assert!(!is_well_formed(PLACEHOLDER_CHECKSUM));
        assert!(!is_well_formed("md5:abc"));
        assert!(!is_well_formed("sha256:xyz"));
    }

    #[test]
    fn digest_bytes_round_trip() {
        let h = prefixed_hash("x");
        let bytes = digest_bytes(&h).unwrap();
        assert_eq!(hex::encode(bytes), strip_hash_prefix(&h));
        // Unprefixed hex is accepted too.
        assert_eq!(digest_bytes(strip_hash_prefix(&h)).unwrap(), bytes);
        assert!(digest_bytes("sha256:beef").is_err());
    }
}
