//! Cryptographically secure code and PIN generation.
//!
//! All randomness comes from the operating system CSPRNG ([`OsRng`]). This is
//! a security property of the generated secrets, not a performance choice.

use rand::Rng;
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Shortest length considered secure for a generated code.
pub const MIN_SECRET_LENGTH: usize = 3;

/// Uppercase letters and digits.
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// [`ALPHANUMERIC`] minus the visually ambiguous O, 0, L, 1 and I.
const HUMAN_READABLE: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Digits only.
const NUMERIC: &[u8] = b"0123456789";

/// Character sets for generated codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// Uppercase letters and digits. Used for activation codes,
    /// authorisation codes and salts.
    Alphanumeric,
    /// Alphanumeric without characters that read ambiguously when shown to a
    /// person. Used for patient one-time PINs.
    HumanReadable,
    /// Digits only. Used for device activation codes.
    Numeric,
}

impl Alphabet {
    /// Returns the characters in this alphabet.
    #[must_use]
    pub fn chars(self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => ALPHANUMERIC,
            Self::HumanReadable => HUMAN_READABLE,
            Self::Numeric => NUMERIC,
        }
    }
}

/// Generates a random string of `length` characters from `alphabet`.
///
/// # Errors
///
/// Returns a `Validation` error if `length` is shorter than
/// [`MIN_SECRET_LENGTH`].
pub fn random_string(length: usize, alphabet: Alphabet) -> Result<String, AuthError> {
    if length < MIN_SECRET_LENGTH {
        return Err(AuthError::validation(format!(
            "cannot generate a secure random string of length < {MIN_SECRET_LENGTH}"
        )));
    }

    let chars = alphabet.chars();
    let mut rng = OsRng;
    Ok((0..length)
        .map(|_| chars[rng.gen_range(0..chars.len())] as char)
        .collect())
}
