//! JWT claims and signing.

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Subject-specific identifiers carried in the token's `metadata` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenMetadata {
    /// A patient token.
    Patient {
        /// The patient's external identifier.
        patient_id: String,
    },
    /// A clinician token, tied to the device it was requested from.
    Clinician {
        /// The clinician's identifier.
        clinician_id: String,
        /// The device that requested the token on the clinician's behalf.
        referring_device_id: String,
    },
    /// A device token.
    Device {
        /// The device's identifier.
        device_id: String,
    },
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject-specific identifiers.
    pub metadata: TokenMetadata,

    /// Issuer URL.
    pub iss: String,

    /// Audience, always equal to the issuer.
    pub aud: String,

    /// Space-separated permitted actions.
    pub scope: String,

    /// Absolute expiry (Unix timestamp).
    pub exp: i64,
}

/// Resolved signing material: algorithm and key, decided once per process.
pub struct SigningKeyMaterial {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
}

impl SigningKeyMaterial {
    /// Resolves signing material from configuration: an RSA private key
    /// selects RS256, a shared secret selects HS512.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the configuration is invalid or
    /// the RSA key cannot be parsed.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;

        if let Some(pem) = &config.signing.rsa_private_key_pem {
            let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AuthError::configuration(format!("invalid RSA private key: {e}")))?;
            Ok(Self {
                algorithm: Algorithm::RS256,
                encoding_key,
            })
        } else if let Some(key) = &config.signing.hs_key {
            Ok(Self {
                algorithm: Algorithm::HS512,
                encoding_key: EncodingKey::from_secret(key.as_bytes()),
            })
        } else {
            // validate() has already rejected this.
            Err(AuthError::configuration("no signing method specified"))
        }
    }

    /// Returns the resolved algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Issues signed, time-limited tokens.
///
/// Issuance is pure given its inputs and the resolved key: the caller
/// supplies the current time.
pub struct TokenIssuer {
    material: SigningKeyMaterial,
    issuer: String,
}

impl TokenIssuer {
    /// Creates an issuer from configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the signing material cannot be
    /// resolved.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        Ok(Self {
            material: SigningKeyMaterial::from_config(config)?,
            issuer: config.issuer.clone(),
        })
    }

    /// Signs a token for `metadata` with the given scope, expiring `ttl`
    /// after `now`.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if encoding fails.
    pub fn issue(
        &self,
        metadata: TokenMetadata,
        scope: impl Into<String>,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> AuthResult<String> {
        let claims = TokenClaims {
            metadata,
            iss: self.issuer.clone(),
            aud: self.issuer.clone(),
            scope: scope.into(),
            exp: now.unix_timestamp() + ttl.as_secs() as i64,
        };

        jsonwebtoken::encode(
            &Header::new(self.material.algorithm),
            &claims,
            &self.material.encoding_key,
        )
        .map_err(|e| AuthError::internal(format!("failed to encode token: {e}")))
    }
}
