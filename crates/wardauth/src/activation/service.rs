//! Activation service wiring and shared types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::expiry::Clock;
use crate::storage::{
    DeviceActivationStore, DeviceStore, PatientActivationStore, PatientStore,
};

/// The two kinds of activation, resolved once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Patient activation: lookup code plus hashed one-time PIN.
    Patient,
    /// Device activation: the code itself is the secret.
    Device,
}

/// Everything a patient needs to redeem an activation. The PIN is returned
/// exactly once and never persisted in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientActivationGrant {
    /// The one-time PIN, lowercase human-readable characters.
    pub otp: String,

    /// The activation code to present alongside the PIN.
    pub activation_code: String,

    /// When the activation expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// A freshly created device activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceActivationGrant {
    /// The activation code, numeric.
    pub code: String,

    /// When the activation expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Result of a successful patient activation validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientAuthorisation {
    /// The authorisation code to exchange for tokens. Returned in plaintext
    /// exactly once; only its digest is stored.
    pub authorisation_code: String,

    /// The patient the authorisation belongs to.
    pub patient_id: String,
}

/// Result of a successful device activation validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAuthorisation {
    /// The authorisation code to exchange for tokens.
    pub authorisation_code: String,

    /// The device the authorisation belongs to.
    pub device_id: String,
}

/// A validated activation of either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authorisation {
    /// A patient authorisation.
    Patient(PatientAuthorisation),
    /// A device authorisation.
    Device(DeviceAuthorisation),
}

/// Creates and validates activations for patients and devices.
///
/// All mutation of subjects and activations goes through this service; the
/// stores are collaborators, not owners of the rules.
pub struct ActivationService {
    pub(crate) patients: Arc<dyn PatientStore>,
    pub(crate) devices: Arc<dyn DeviceStore>,
    pub(crate) patient_activations: Arc<dyn PatientActivationStore>,
    pub(crate) device_activations: Arc<dyn DeviceActivationStore>,
    pub(crate) config: AuthConfig,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ActivationService {
    /// Creates an activation service over the given stores.
    #[must_use]
    pub fn new(
        patients: Arc<dyn PatientStore>,
        devices: Arc<dyn DeviceStore>,
        patient_activations: Arc<dyn PatientActivationStore>,
        device_activations: Arc<dyn DeviceActivationStore>,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            patients,
            devices,
            patient_activations,
            device_activations,
            config,
            clock,
        }
    }

    /// Validates an activation of the given kind.
    ///
    /// Patient validations require the one-time PIN; device validations carry
    /// no separate secret.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when a patient validation is missing its PIN, and
    /// otherwise the errors of the kind-specific validation.
    pub async fn validate(
        &self,
        kind: ActivationKind,
        code: &str,
        otp: Option<&str>,
    ) -> AuthResult<Authorisation> {
        match kind {
            ActivationKind::Patient => {
                let otp = otp.ok_or_else(|| {
                    AuthError::validation("a one-time PIN is required to validate a patient activation")
                })?;
                self.validate_patient_activation(code, otp)
                    .await
                    .map(Authorisation::Patient)
            }
            ActivationKind::Device => self
                .validate_device_activation(code)
                .await
                .map(Authorisation::Device),
        }
    }
}
