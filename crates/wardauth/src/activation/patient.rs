//! Patient activation flow.

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::expiry::{end_of_day_expiry, is_expired};
use crate::hash::{digests_match, hash_with_salt};
use crate::secret::{Alphabet, random_string};
use crate::static_ids::{is_static_patient_id, static_code_char};
use crate::storage::{Patient, PatientActivation};

use super::service::{ActivationService, PatientActivationGrant, PatientAuthorisation};

impl ActivationService {
    /// Creates (or refreshes) an activation for a patient.
    ///
    /// An existing unused activation keeps its code but has its PIN, salt and
    /// attempts reset and its life extended. Unknown patients are created
    /// lazily. Static patients outside production get a deterministic
    /// code/PIN pair instead.
    ///
    /// # Errors
    ///
    /// Returns an error if secret generation, hashing or a storage operation
    /// fails.
    pub async fn create_patient_activation(
        &self,
        patient_id: &str,
    ) -> AuthResult<PatientActivationGrant> {
        let existing = self
            .patient_activations
            .find_unused_by_patient(patient_id)
            .await?;

        if !self.config.environment.is_production() && is_static_patient_id(patient_id) {
            return self.reset_static_patient_activation(patient_id, existing).await;
        }

        let now = self.clock.now_utc();
        let otp = random_string(self.config.otp_length, Alphabet::HumanReadable)?.to_lowercase();
        let otp_salt = random_string(self.config.salt_length, Alphabet::Alphanumeric)?;
        let hashed_otp = hash_with_salt(&otp, &otp_salt)?;

        let activation_code = if let Some(activation) = existing {
            // Same code, fresh secret, attempts back to zero, life extended.
            self.patient_activations
                .refresh_secret(&activation.uuid, &hashed_otp, &otp_salt, now)
                .await?;
            activation.code
        } else {
            if self.patients.find_by_patient_id(patient_id).await?.is_none() {
                self.patients.create(&Patient::new(patient_id)).await?;
            }

            let code =
                random_string(self.config.authorisation_code_length, Alphabet::Alphanumeric)?;
            let activation =
                PatientActivation::new(patient_id, code.clone(), hashed_otp, otp_salt, now);
            self.patient_activations.insert(&activation).await?;
            code
        };

        Ok(PatientActivationGrant {
            otp,
            activation_code,
            expires_at: end_of_day_expiry(now, self.config.activation_expiry_days),
        })
    }

    /// Redeems a patient activation with its one-time PIN.
    ///
    /// A wrong PIN durably increments the attempts count before the call
    /// fails. On success a new authorisation code is minted, its digest
    /// stored on the patient (overwriting any prior authorisation), and the
    /// activation marked used unless the patient is static outside
    /// production.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no redeemable activation matches the code,
    /// the PIN is wrong, or the activation has expired without a static
    /// exemption. The three cases are deliberately indistinguishable.
    pub async fn validate_patient_activation(
        &self,
        code: &str,
        otp: &str,
    ) -> AuthResult<PatientAuthorisation> {
        let mut existing = self
            .patient_activations
            .find_redeemable(code, self.config.max_activation_attempts)
            .await?;

        if let Some(activation) = &existing {
            let provided = hash_with_salt(otp, &activation.otp_salt)?;
            if !digests_match(&provided, &activation.hashed_otp) {
                tracing::debug!("incorrect one-time PIN supplied");
                self.patient_activations
                    .increment_attempts(&activation.uuid)
                    .await?;
                existing = None;
            }
        }

        let Some(activation) = existing else {
            return Err(AuthError::not_found("could not find relevant activation"));
        };

        let now = self.clock.now_utc();
        if !self.activation_window_open(now, activation.modified, &activation.patient_id) {
            return Err(AuthError::not_found("could not find relevant activation"));
        }

        let authorisation_code =
            random_string(self.config.authorisation_code_length, Alphabet::Alphanumeric)?;
        let salt = random_string(self.config.salt_length, Alphabet::Alphanumeric)?;
        let hashed_code = hash_with_salt(&authorisation_code, &salt)?;

        self.patients
            .set_authorisation_code(&activation.patient_id, &hashed_code, &salt)
            .await?;

        let mark_used = self.config.environment.is_production()
            || !is_static_patient_id(&activation.patient_id);
        self.patient_activations
            .complete(&activation.uuid, mark_used, now, 0)
            .await?;

        Ok(PatientAuthorisation {
            authorisation_code,
            patient_id: activation.patient_id,
        })
    }

    /// Returns the completed activations for a patient, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn patient_activation_history(
        &self,
        patient_id: &str,
    ) -> AuthResult<Vec<PatientActivation>> {
        self.patient_activations
            .completed_for_patient(patient_id)
            .await
    }

    /// An activation is redeemable while unexpired; once expired only static
    /// patients outside production remain redeemable.
    fn activation_window_open(
        &self,
        now: OffsetDateTime,
        modified: OffsetDateTime,
        patient_id: &str,
    ) -> bool {
        if !is_expired(now, modified, self.config.activation_expiry_days) {
            return true;
        }
        !self.config.environment.is_production() && is_static_patient_id(patient_id)
    }

    /// Creates or resets the activation of a static patient. Static patients
    /// have a deterministic code and PIN derived from the identifier's last
    /// character, and their activation is reusable indefinitely.
    async fn reset_static_patient_activation(
        &self,
        patient_id: &str,
        existing: Option<PatientActivation>,
    ) -> AuthResult<PatientActivationGrant> {
        tracing::debug!(patient_id, "resetting static activation");

        let static_char = static_code_char(patient_id)
            .ok_or_else(|| AuthError::validation("empty patient identifier"))?;
        let otp = static_char
            .to_string()
            .repeat(self.config.otp_length)
            .to_lowercase();
        let now = self.clock.now_utc();

        let activation_code = if let Some(activation) = existing {
            // The stored PIN digest already matches the deterministic PIN;
            // refreshing it keeps the attempts count clear and the record
            // alive.
            self.patient_activations
                .refresh_secret(&activation.uuid, &activation.hashed_otp, &activation.otp_salt, now)
                .await?;
            activation.code
        } else {
            let otp_salt = random_string(self.config.salt_length, Alphabet::Alphanumeric)?;
            let hashed_otp = hash_with_salt(&otp, &otp_salt)?;
            let code = static_char.to_string();

            if self.patients.find_by_patient_id(patient_id).await?.is_none() {
                // Static patients are born pre-authorised with a digest of
                // their static character, so token exchange works without a
                // prior validation round.
                let salt = static_char.to_string().repeat(self.config.salt_length);
                let hashed_code = hash_with_salt(&static_char.to_string(), &salt)?;
                let mut patient = Patient::new(patient_id);
                patient.hashed_authorisation_code = Some(hashed_code);
                patient.authorisation_code_salt = Some(salt);
                self.patients.create(&patient).await?;
            }

            let mut activation =
                PatientActivation::new(patient_id, code.clone(), hashed_otp, otp_salt, now);
            activation.activated_timestamp = Some(now);
            activation.activated_timezone = Some(0);
            self.patient_activations.insert(&activation).await?;
            code
        };

        Ok(PatientActivationGrant {
            otp,
            activation_code,
            expires_at: end_of_day_expiry(now, self.config.activation_expiry_days),
        })
    }
}
