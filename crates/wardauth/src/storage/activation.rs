//! Activation records and storage traits.
//!
//! An activation is a short-lived, single-use credential-issuance record
//! tying a one-time secret to a subject. There is at most one unused
//! activation per subject at a time: re-requests refresh the existing record
//! instead of creating duplicates. Records are never physically deleted by
//! the normal flow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// A patient activation.
///
/// The one-time PIN is stored only as a salted scrypt digest; the `code` is
/// the caller-facing lookup key and must be unique among unused records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientActivation {
    /// Row identifier, unique to this store.
    pub uuid: String,

    /// External identifier of the owning patient.
    pub patient_id: String,

    /// Activation code, the lookup key presented at validation.
    pub code: String,

    /// scrypt digest of the one-time PIN.
    pub hashed_otp: Vec<u8>,

    /// Salt the PIN digest was derived under.
    pub otp_salt: String,

    /// Whether the activation has been consumed (terminal).
    pub used: bool,

    /// Failed validation attempts so far. Once this reaches the configured
    /// maximum the record is unredeemable even with the correct PIN.
    pub attempts_count: u32,

    /// Last refresh time; the expiry window is measured from here.
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,

    /// When the activation was successfully validated.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub activated_timestamp: Option<OffsetDateTime>,

    /// UTC offset (hours) reported at validation time.
    pub activated_timezone: Option<i32>,
}

impl PatientActivation {
    /// Creates a fresh unused activation.
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        code: impl Into<String>,
        hashed_otp: Vec<u8>,
        otp_salt: impl Into<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            code: code.into(),
            hashed_otp,
            otp_salt: otp_salt.into(),
            used: false,
            attempts_count: 0,
            modified: now,
            activated_timestamp: None,
            activated_timezone: None,
        }
    }
}

/// A device activation.
///
/// The code itself is the one-time secret; unlike the patient PIN it is
/// stored and compared in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceActivation {
    /// Row identifier, unique to this store.
    pub uuid: String,

    /// Identifier of the owning device.
    pub device_id: String,

    /// Activation code, both lookup key and secret.
    pub code: String,

    /// Whether the activation has been consumed (terminal).
    pub used: bool,

    /// Last refresh time; the expiry window is measured from here.
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,

    /// When the activation was successfully validated.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub activated_timestamp: Option<OffsetDateTime>,

    /// UTC offset (hours) reported at validation time.
    pub activated_timezone: Option<i32>,
}

impl DeviceActivation {
    /// Creates a fresh unused activation.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        code: impl Into<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            code: code.into(),
            used: false,
            modified: now,
            activated_timestamp: None,
            activated_timezone: None,
        }
    }
}

/// Storage operations for patient activations.
#[async_trait]
pub trait PatientActivationStore: Send + Sync {
    /// Finds the unused activation for a patient, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_unused_by_patient(&self, patient_id: &str)
    -> AuthResult<Option<PatientActivation>>;

    /// Finds an activation by code that is unused and still under the
    /// attempts limit. Exhausted records are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_redeemable(
        &self,
        code: &str,
        max_attempts: u32,
    ) -> AuthResult<Option<PatientActivation>>;

    /// Inserts a new activation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An unused activation with the same code already exists
    /// - The storage operation fails
    async fn insert(&self, activation: &PatientActivation) -> AuthResult<()>;

    /// Replaces the PIN digest and salt of an activation, resets its attempts
    /// count and bumps `modified`, extending its life.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The activation doesn't exist
    /// - The storage operation fails
    async fn refresh_secret(
        &self,
        activation_uuid: &str,
        hashed_otp: &[u8],
        otp_salt: &str,
        modified: OffsetDateTime,
    ) -> AuthResult<()>;

    /// Atomically increments the attempts count, returning the new value.
    /// The increment is durable even when the surrounding validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The activation doesn't exist
    /// - The storage operation fails
    async fn increment_attempts(&self, activation_uuid: &str) -> AuthResult<u32>;

    /// Records a successful validation: sets the used flag as instructed and
    /// stamps the activation time. Static subjects outside production pass
    /// `used = false` to stay perpetually redeemable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The activation doesn't exist
    /// - The storage operation fails
    async fn complete(
        &self,
        activation_uuid: &str,
        used: bool,
        activated_at: OffsetDateTime,
        activated_timezone: i32,
    ) -> AuthResult<()>;

    /// Returns the completed activations for a patient, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn completed_for_patient(&self, patient_id: &str)
    -> AuthResult<Vec<PatientActivation>>;
}

/// Storage operations for device activations.
#[async_trait]
pub trait DeviceActivationStore: Send + Sync {
    /// Finds the unused activation for a device, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_unused_by_device(&self, device_id: &str)
    -> AuthResult<Option<DeviceActivation>>;

    /// Finds an unused activation by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_redeemable(&self, code: &str) -> AuthResult<Option<DeviceActivation>>;

    /// Inserts a new activation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An unused activation with the same code already exists
    /// - The storage operation fails
    async fn insert(&self, activation: &DeviceActivation) -> AuthResult<()>;

    /// Replaces the code of an activation and bumps `modified`, extending its
    /// life.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The activation doesn't exist
    /// - The storage operation fails
    async fn refresh_code(
        &self,
        activation_uuid: &str,
        code: &str,
        modified: OffsetDateTime,
    ) -> AuthResult<()>;

    /// Records a successful validation: sets the used flag as instructed and
    /// stamps the activation time.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The activation doesn't exist
    /// - The storage operation fails
    async fn complete(
        &self,
        activation_uuid: &str,
        used: bool,
        activated_at: OffsetDateTime,
        activated_timezone: i32,
    ) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_new_patient_activation() {
        let now = datetime!(2020-06-01 10:00:00 UTC);
        let activation = PatientActivation::new("abc123", "CODE", vec![1, 2, 3], "SALT", now);
        assert!(!activation.used);
        assert_eq!(activation.attempts_count, 0);
        assert_eq!(activation.modified, now);
        assert!(activation.activated_timestamp.is_none());
    }

    #[test]
    fn test_new_device_activation() {
        let now = datetime!(2020-06-01 10:00:00 UTC);
        let activation = DeviceActivation::new("device-1", "123456789", now);
        assert!(!activation.used);
        assert_eq!(activation.code, "123456789");
        assert!(activation.activated_timestamp.is_none());
    }
}
