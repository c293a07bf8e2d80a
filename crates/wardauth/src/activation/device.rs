//! Device activation flow.
//!
//! Device activations carry no separate one-time PIN: the numeric code is
//! the secret, stored in plaintext. Patient and device flows otherwise share
//! the same expiry, refresh and single-use rules.

use crate::AuthResult;
use crate::error::AuthError;
use crate::expiry::{end_of_day_expiry, is_expired};
use crate::hash::hash_with_salt;
use crate::secret::{Alphabet, random_string};
use crate::static_ids::{is_static_device_id, static_code_char};
use crate::storage::DeviceActivation;

use super::service::{ActivationService, DeviceActivationGrant, DeviceAuthorisation};

impl ActivationService {
    /// Creates (or refreshes) an activation for a known device.
    ///
    /// Static devices outside production get a deterministic code: the
    /// identifier's last character repeated to the configured length.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown device, or an error if secret
    /// generation or a storage operation fails.
    pub async fn create_device_activation(
        &self,
        device_id: &str,
    ) -> AuthResult<DeviceActivationGrant> {
        self.devices
            .find(device_id)
            .await?
            .ok_or_else(|| AuthError::not_found("device not found"))?;

        let existing = self
            .device_activations
            .find_unused_by_device(device_id)
            .await?;

        let code = if !self.config.environment.is_production() && is_static_device_id(device_id) {
            let static_char = static_code_char(device_id)
                .ok_or_else(|| AuthError::validation("empty device identifier"))?;
            static_char
                .to_string()
                .repeat(self.config.device_activation_code_length)
        } else {
            random_string(self.config.device_activation_code_length, Alphabet::Numeric)?
        };

        let now = self.clock.now_utc();
        if let Some(activation) = existing {
            self.device_activations
                .refresh_code(&activation.uuid, &code, now)
                .await?;
        } else {
            self.device_activations
                .insert(&DeviceActivation::new(device_id, code.clone(), now))
                .await?;
        }

        Ok(DeviceActivationGrant {
            code,
            expires_at: end_of_day_expiry(now, self.config.activation_expiry_days),
        })
    }

    /// Redeems a device activation by its code.
    ///
    /// On success a new authorisation code is minted, its digest stored on
    /// the device (overwriting any prior authorisation), and the activation
    /// marked used unless the device is static outside production.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no unused activation matches the code or the
    /// activation has expired without a static exemption.
    pub async fn validate_device_activation(
        &self,
        code: &str,
    ) -> AuthResult<DeviceAuthorisation> {
        let activation = self.device_activations.find_redeemable(code).await?;

        let Some(activation) = activation else {
            tracing::info!("invalid device activation code supplied");
            return Err(AuthError::not_found("could not find relevant activation"));
        };

        let now = self.clock.now_utc();
        let window_open = !is_expired(now, activation.modified, self.config.activation_expiry_days)
            || (!self.config.environment.is_production()
                && is_static_device_id(&activation.device_id));
        if !window_open {
            return Err(AuthError::not_found("could not find relevant activation"));
        }

        let authorisation_code =
            random_string(self.config.authorisation_code_length, Alphabet::Alphanumeric)?;
        let salt = random_string(self.config.salt_length, Alphabet::Alphanumeric)?;
        let hashed_code = hash_with_salt(&authorisation_code, &salt)?;

        self.devices
            .set_authorisation_code(&activation.device_id, &hashed_code, &salt)
            .await?;

        let mark_used = self.config.environment.is_production()
            || !is_static_device_id(&activation.device_id);
        self.device_activations
            .complete(&activation.uuid, mark_used, now, 0)
            .await?;

        Ok(DeviceAuthorisation {
            authorisation_code,
            device_id: activation.device_id,
        })
    }
}
