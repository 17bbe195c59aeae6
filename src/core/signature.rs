//! Algorithm-agnostic signing and verification over content hashes.
//!
//! The scheme is derived from the key material, never selected by the
//! caller: Ed25519 and RSA (PKCS#1 v1.5 with SHA-256) share one capability
//! surface. Signatures are produced over the raw 32 digest bytes, not the
//! hex string. Verification returns a boolean; a mismatched signature is a
//! normal negative result, not an error. Only malformed key material is a
//! hard error.
//!
//! Witness signatures use the same primitives as self signatures; witness
//! identity is an external name string and trust policy lives outside this
//! crate.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::core::error::AttestError;
use crate::core::hash;

pub const ALG_ED25519: &str = "ed25519";
pub const ALG_RSA: &str = "rsa";

/// A produced signature: base64 bytes plus the algorithm the key implied.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SignatureRecord {
    pub alg: String,
    pub sig: String,
}

/// Capability to sign a digest. One implementation per key type.
pub trait DigestSigner {
    fn algorithm(&self) -> &'static str;
    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, AttestError>;
}

/// Capability to verify a digest signature. One implementation per key type.
pub trait DigestVerifier {
    fn algorithm(&self) -> &'static str;
    fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> bool;
}

struct Ed25519DigestSigner(SigningKey);
struct RsaDigestSigner(rsa::pkcs1v15::SigningKey<Sha256>);
struct Ed25519DigestVerifier(VerifyingKey);
struct RsaDigestVerifier(rsa::pkcs1v15::VerifyingKey<Sha256>);

impl DigestSigner for Ed25519DigestSigner {
    fn algorithm(&self) -> &'static str {
        ALG_ED25519
    }

    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, AttestError> {
        Ok(self.0.sign(digest).to_bytes().to_vec())
    }
}

impl DigestSigner for RsaDigestSigner {
    fn algorithm(&self) -> &'static str {
        ALG_RSA
    }

    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, AttestError> {
        let signature = self
            .0
            .try_sign(digest)
            .map_err(|e| AttestError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

impl DigestVerifier for Ed25519DigestVerifier {
    fn algorithm(&self) -> &'static str {
        ALG_ED25519
    }

    fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> bool {
        let Ok(sig_array) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&sig_array);
        self.0.verify(digest, &signature).is_ok()
    }
}

impl DigestVerifier for RsaDigestVerifier {
    fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = rsa::pkcs1v15::Signature::try_from(signature) else {
            return false;
        };
        self.0.verify(digest, &signature).is_ok()
    }

    fn algorithm(&self) -> &'static str {
        ALG_RSA
    }
}

/// Extract DER bytes from a PEM body, or decode raw base64 when the input
/// carries no armor at all.
fn pem_body(pem: &str) -> Result<Vec<u8>, AttestError> {
    let b64: String = if pem.contains("-----BEGIN") {
        pem.lines()
            .filter(|l| !l.starts_with("-----"))
            .collect::<Vec<_>>()
            .join("")
    } else {
        pem.trim().to_string()
    };
    BASE64
        .decode(b64.trim())
        .map_err(|e| AttestError::InvalidKey(format!("base64 decode: {}", e)))
}

fn ed25519_key_bytes(der: &[u8]) -> Result<[u8; 32], AttestError> {
    // PKCS#8/SPKI wrappers put the raw 32-byte key last.
    if der.len() < 32 {
        return Err(AttestError::InvalidKey("Ed25519 key too short".into()));
    }
    let bytes: [u8; 32] = der[der.len() - 32..]
        .try_into()
        .map_err(|_| AttestError::InvalidKey("invalid Ed25519 key length".into()))?;
    Ok(bytes)
}

/// Parse a private key from PEM (or raw base64 Ed25519 seed) and return its
/// signing capability. The algorithm is implied by the key, not chosen.
pub fn signer_from_pem(pem: &str) -> Result<Box<dyn DigestSigner>, AttestError> {
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| AttestError::InvalidKey(e.to_string()))?;
        return Ok(Box::new(RsaDigestSigner(rsa::pkcs1v15::SigningKey::new(key))));
    }
    let der = pem_body(pem)?;
    // Ed25519 PKCS#8 private keys are tiny; anything larger is RSA.
    if der.len() <= 128 {
        let seed = ed25519_key_bytes(&der)?;
        return Ok(Box::new(Ed25519DigestSigner(SigningKey::from_bytes(&seed))));
    }
    let key =
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| AttestError::InvalidKey(e.to_string()))?;
    Ok(Box::new(RsaDigestSigner(rsa::pkcs1v15::SigningKey::new(key))))
}

/// Parse a public key from PEM (or raw base64 Ed25519 key) and return its
/// verifying capability.
pub fn verifier_from_pem(pem: &str) -> Result<Box<dyn DigestVerifier>, AttestError> {
    if pem.contains("BEGIN RSA PUBLIC KEY") {
        let key = RsaPublicKey::from_pkcs1_pem(pem)
            .map_err(|e| AttestError::InvalidKey(e.to_string()))?;
        return Ok(Box::new(RsaDigestVerifier(rsa::pkcs1v15::VerifyingKey::new(key))));
    }
    let der = pem_body(pem)?;
    if der.len() <= 64 {
        let bytes = ed25519_key_bytes(&der)?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| AttestError::InvalidKey(e.to_string()))?;
        return Ok(Box::new(Ed25519DigestVerifier(key)));
    }
    let key =
        RsaPublicKey::from_public_key_pem(pem).map_err(|e| AttestError::InvalidKey(e.to_string()))?;
    Ok(Box::new(RsaDigestVerifier(rsa::pkcs1v15::VerifyingKey::new(key))))
}

/// Sign a content hash (`sha256:<hex>` or bare hex). The digest bytes are
/// the message; the hash already serves as the document digest.
pub fn sign_hash(hash_hex: &str, signer: &dyn DigestSigner) -> Result<SignatureRecord, AttestError> {
    let digest = hash::digest_bytes(hash_hex)?;
    let sig = signer.sign_digest(&digest)?;
    Ok(SignatureRecord {
        alg: signer.algorithm().to_string(),
        sig: BASE64.encode(sig),
    })
}

/// Verify a base64 signature over a content hash. Malformed signatures and
/// mismatches both return `false`; only bad key material errors upstream.
pub fn verify_hash(
    hash_hex: &str,
    signature_b64: &str,
    verifier: &dyn DigestVerifier,
) -> Result<bool, AttestError> {
    let digest = hash::digest_bytes(hash_hex)?;
    let Ok(sig_bytes) = BASE64.decode(signature_b64.trim()) else {
        return Ok(false);
    };
    Ok(verifier.verify_digest(&digest, &sig_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::prefixed_hash;
    use rand::rngs::OsRng;

    fn ed25519_pair() -> (String, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let private_b64 = BASE64.encode(signing_key.to_bytes());
        let public_b64 = BASE64.encode(signing_key.verifying_key().to_bytes());
        (private_b64, public_b64)
    }

    #[test]
    fn ed25519_sign_verify_round_trip() {
        let (private_pem, public_pem) = ed25519_pair();
        let hash = prefixed_hash("canonical document body\n");

        let signer = signer_from_pem(&private_pem).unwrap();
        assert_eq!(signer.algorithm(), ALG_ED25519);
        let record = sign_hash(&hash, signer.as_ref()).unwrap();
        assert_eq!(record.alg, ALG_ED25519);

        let verifier = verifier_from_pem(&public_pem).unwrap();
        assert!(verify_hash(&hash, &record.sig, verifier.as_ref()).unwrap());
    }

    #[test]
    fn altered_hash_fails_verification() {
        let (private_pem, public_pem) = ed25519_pair();
        let hash = prefixed_hash("original");
        let other = prefixed_hash("tampered");

        let signer = signer_from_pem(&private_pem).unwrap();
        let record = sign_hash(&hash, signer.as_ref()).unwrap();
        let verifier = verifier_from_pem(&public_pem).unwrap();
        assert!(!verify_hash(&other, &record.sig, verifier.as_ref()).unwrap());
    }

    #[test]
    fn mismatched_keypair_fails_verification() {
        let (private_pem, _) = ed25519_pair();
        let (_, other_public) = ed25519_pair();
        let hash = prefixed_hash("body");

        let signer = signer_from_pem(&private_pem).unwrap();
        let record = sign_hash(&hash, signer.as_ref()).unwrap();
        let verifier = verifier_from_pem(&other_public).unwrap();
        assert!(!verify_hash(&hash, &record.sig, verifier.as_ref()).unwrap());
    }

    #[test]
    fn malformed_signature_is_false_not_error() {
        let (_, public_pem) = ed25519_pair();
        let verifier = verifier_from_pem(&public_pem).unwrap();
        let hash = prefixed_hash("body");
        assert!(!verify_hash(&hash, "@@not-base64@@", verifier.as_ref()).unwrap());
        assert!(!verify_hash(&hash, "AAA=", verifier.as_ref()).unwrap());
    }

    #[test]
    fn malformed_key_is_an_error() {
        assert!(signer_from_pem("not a key").is_err());
        assert!(verifier_from_pem("@@@").is_err());
    }
}
