//! One-way hashing of one-time PINs and authorisation codes.
//!
//! Secrets are never stored in plaintext; only a salted scrypt digest is
//! persisted. scrypt is deliberately slow and memory-hard, which is the point:
//! offline brute force of a leaked digest has to pay the same cost per guess.

use scrypt::Params;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Digest length in bytes.
pub const DIGEST_LENGTH: usize = 256;

// Work factors: N = 2^14 = 16384, r = 8, p = 1.
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Derives a [`DIGEST_LENGTH`]-byte scrypt digest of `secret` under `salt`.
///
/// Hashing is deterministic: equal `(secret, salt)` pairs always produce
/// equal digests. The salt is the only source of digest variation.
///
/// # Errors
///
/// Returns an `Internal` error if the KDF rejects its parameters, which does
/// not happen for the fixed work factors used here.
pub fn hash_with_salt(secret: &str, salt: &str) -> Result<Vec<u8>, AuthError> {
    // `Params::new` only accepts a `len` in 10..=64, and `scrypt::scrypt`
    // ignores it — the output length is taken from the buffer below.
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, Params::RECOMMENDED_LEN)
        .map_err(|e| AuthError::internal(format!("invalid scrypt parameters: {e}")))?;

    let mut digest = vec![0u8; DIGEST_LENGTH];
    scrypt::scrypt(secret.as_bytes(), salt.as_bytes(), &params, &mut digest)
        .map_err(|e| AuthError::internal(format!("scrypt failed: {e}")))?;
    Ok(digest)
}

/// Compares two digests in constant time.
///
/// Digests of differing length never match.
#[must_use]
pub fn digests_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_length() {
        let digest = hash_with_salt("1234", "somesalt").unwrap();
        assert_eq!(digest.len(), DIGEST_LENGTH);
    }

    #[test]
    fn test_deterministic() {
        let a = hash_with_salt("h3k5", "SALTSALTSALT").unwrap();
        let b = hash_with_salt("h3k5", "SALTSALTSALT").unwrap();
        assert_eq!(a, b);
        assert!(digests_match(&a, &b));
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = hash_with_salt("h3k5", "SALT-ONE").unwrap();
        let b = hash_with_salt("h3k5", "SALT-TWO").unwrap();
        assert_ne!(a, b);
        assert!(!digests_match(&a, &b));
    }

    #[test]
    fn test_secret_changes_digest() {
        let a = hash_with_salt("h3k5", "SALT").unwrap();
        let b = hash_with_salt("h3k6", "SALT").unwrap();
        assert!(!digests_match(&a, &b));
    }

    #[test]
    fn test_length_mismatch_never_matches() {
        let a = hash_with_salt("h3k5", "SALT").unwrap();
        assert!(!digests_match(&a, &a[..DIGEST_LENGTH - 1]));
    }
}
