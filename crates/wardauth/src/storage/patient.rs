//! Patient record and storage trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// A patient known to the activation authority.
///
/// Patients are created lazily on their first activation request; the
/// `patient_id` is assigned by an external system and is the identifier
/// callers use throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Row identifier, unique to this store.
    pub uuid: String,

    /// Externally assigned patient identifier, unique.
    pub patient_id: String,

    /// scrypt digest of the current authorisation code. Set on the first
    /// successful activation and overwritten on every subsequent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_authorisation_code: Option<Vec<u8>>,

    /// Salt the authorisation-code digest was derived under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorisation_code_salt: Option<String>,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Patient {
    /// Creates a new patient with no authorisation code.
    #[must_use]
    pub fn new(patient_id: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            hashed_authorisation_code: None,
            authorisation_code_salt: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage operations for patients.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Finds a patient by external identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_patient_id(&self, patient_id: &str) -> AuthResult<Option<Patient>>;

    /// Creates a new patient.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A patient with the same `patient_id` already exists
    /// - The storage operation fails
    async fn create(&self, patient: &Patient) -> AuthResult<Patient>;

    /// Stores a new authorisation-code digest and salt for a patient,
    /// overwriting any previous pair.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The patient doesn't exist
    /// - The storage operation fails
    async fn set_authorisation_code(
        &self,
        patient_id: &str,
        hashed_code: &[u8],
        salt: &str,
    ) -> AuthResult<()>;
}
