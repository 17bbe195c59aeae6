//! Shared attestation machinery: error taxonomy, accumulating reports,
//! content hashing, and algorithm-agnostic signatures.

pub mod error;
pub mod hash;
pub mod report;
pub mod signature;
