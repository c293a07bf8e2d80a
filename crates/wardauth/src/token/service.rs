//! Authorisation-code exchange for signed tokens.

use std::sync::Arc;

use crate::AuthResult;
use crate::access::{self, AccessDecision, DenyReason};
use crate::audit::{AuditEvent, AuditSink};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::expiry::Clock;
use crate::hash::{digests_match, hash_with_salt};
use crate::scope::{ScopeService, TokenRole};
use crate::storage::{ClinicianStore, DeviceStore, PatientStore};

use super::issuer::{TokenIssuer, TokenMetadata};

/// A signed bearer token.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedToken {
    /// The encoded JWT.
    pub jwt: String,
}

/// Exchanges authorisation codes (and clinician identifiers) for tokens.
pub struct TokenService {
    patients: Arc<dyn PatientStore>,
    devices: Arc<dyn DeviceStore>,
    clinicians: Arc<dyn ClinicianStore>,
    issuer: TokenIssuer,
    scopes: ScopeService,
    audit: Arc<dyn AuditSink>,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Creates a token service over the given collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        patients: Arc<dyn PatientStore>,
        devices: Arc<dyn DeviceStore>,
        clinicians: Arc<dyn ClinicianStore>,
        issuer: TokenIssuer,
        scopes: ScopeService,
        audit: Arc<dyn AuditSink>,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            patients,
            devices,
            clinicians,
            issuer,
            scopes,
            audit,
            config,
            clock,
        }
    }

    /// Exchanges a patient's authorisation code for a token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown patient, a patient without a stored
    /// authorisation, or a digest mismatch; the cases are deliberately
    /// indistinguishable.
    pub async fn patient_token(
        &self,
        patient_id: &str,
        authorisation_code: &str,
    ) -> AuthResult<IssuedToken> {
        let not_found = || AuthError::not_found("invalid combination of patient_id and code");

        let Some(patient) = self.patients.find_by_patient_id(patient_id).await? else {
            tracing::info!(patient_id, "patient not found");
            return Err(not_found());
        };

        let (Some(stored), Some(salt)) = (
            patient.hashed_authorisation_code.as_deref(),
            patient.authorisation_code_salt.as_deref(),
        ) else {
            tracing::info!(patient_id, "patient has no stored authorisation");
            return Err(not_found());
        };

        let provided = hash_with_salt(authorisation_code, salt)?;
        if !digests_match(&provided, stored) {
            tracing::info!(patient_id, "patient provided incorrect authorisation code");
            return Err(not_found());
        }

        let scope = self.scopes.get_scope(TokenRole::Patient).await?;
        let jwt = self.issuer.issue(
            TokenMetadata::Patient {
                patient_id: patient_id.to_string(),
            },
            scope,
            self.config.token_ttl,
            self.clock.now_utc(),
        )?;
        Ok(IssuedToken { jwt })
    }

    /// Exchanges a device's authorisation code for a token.
    ///
    /// Auth failures for activated devices are audited before being
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for an unknown device, a device that has
    /// never been activated, a digest mismatch, or a deactivated device.
    pub async fn device_token(
        &self,
        device_id: &str,
        authorisation_code: &str,
    ) -> AuthResult<IssuedToken> {
        let Some(device) = self.devices.find(device_id).await? else {
            return Err(AuthError::permission_denied("invalid device identifier"));
        };

        let (Some(stored), Some(salt)) = (
            device.hashed_authorisation_code.as_deref(),
            device.authorisation_code_salt.as_deref(),
        ) else {
            tracing::info!(device_id, "device has not been activated");
            self.audit
                .publish(AuditEvent::SendEntryDeviceAuthFailure {
                    device_id: device_id.to_string(),
                    reason: "Device has not been activated".to_string(),
                })
                .await;
            return Err(AuthError::permission_denied("invalid device identifier"));
        };

        let provided = hash_with_salt(authorisation_code, salt)?;
        if !digests_match(&provided, stored) || !device.active {
            tracing::info!(device_id, "validation of auth code failed for device");
            self.audit
                .publish(AuditEvent::SendEntryDeviceAuthFailure {
                    device_id: device_id.to_string(),
                    reason: "Device auth code validation failed".to_string(),
                })
                .await;
            return Err(AuthError::permission_denied("could not retrieve token"));
        }

        self.audit
            .publish(AuditEvent::SendEntryDeviceAuthSuccess {
                device_id: device.uuid.clone(),
            })
            .await;

        let scope = self.scopes.get_scope(TokenRole::Device).await?;
        let jwt = self.issuer.issue(
            TokenMetadata::Device {
                device_id: device.uuid,
            },
            scope,
            self.config.device_token_ttl,
            self.clock.now_utc(),
        )?;
        Ok(IssuedToken { jwt })
    }

    /// Issues a clinician token for a SEND entry login from a device.
    ///
    /// An expired contract is reconciled (the login flipped inactive and
    /// persisted) before the decision is reported. Every outcome is audited
    /// before being returned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown SEND entry identifier and
    /// `PermissionDenied` for an inactive login or missing group
    /// membership.
    pub async fn clinician_token(
        &self,
        send_entry_identifier: &str,
        device_id: &str,
    ) -> AuthResult<IssuedToken> {
        let Some(clinician) = self
            .clinicians
            .find_by_send_entry_identifier(send_entry_identifier)
            .await?
        else {
            tracing::info!(send_entry_identifier, "clinician not found");
            self.audit
                .publish(AuditEvent::SendEntryLoginFailure {
                    device_id: device_id.to_string(),
                    reason: "Clinician with provided SEND entry identifier not found".to_string(),
                    send_entry_identifier: send_entry_identifier.to_string(),
                    clinician_id: None,
                })
                .await;
            return Err(AuthError::not_found("invalid clinician identifier"));
        };

        let today = self.clock.now_utc().date();
        let (decision, reconciled) = access::evaluate_and_reconcile(&clinician, today);
        if reconciled.is_some() {
            // Temporary staff whose contract has lapsed lose their login now.
            self.clinicians
                .set_login_active(&clinician.clinician_id, false)
                .await?;
        }

        match decision {
            AccessDecision::Deny(DenyReason::InactiveLogin) => {
                self.audit
                    .publish(AuditEvent::SendEntryLoginFailure {
                        device_id: device_id.to_string(),
                        reason: "Clinician contract expired".to_string(),
                        send_entry_identifier: send_entry_identifier.to_string(),
                        clinician_id: Some(clinician.clinician_id.clone()),
                    })
                    .await;
                Err(AuthError::permission_denied("clinician is not active"))
            }
            AccessDecision::Deny(DenyReason::NotAuthorised) => {
                tracing::info!(
                    send_entry_identifier,
                    "unauthorised clinician attempted to access SEND entry"
                );
                self.audit
                    .publish(AuditEvent::SendEntryLoginFailure {
                        device_id: device_id.to_string(),
                        reason: "Clinician is not authorised to access SEND entry".to_string(),
                        send_entry_identifier: send_entry_identifier.to_string(),
                        clinician_id: Some(clinician.clinician_id.clone()),
                    })
                    .await;
                Err(AuthError::permission_denied(
                    "clinician is not authorised to access SEND entry",
                ))
            }
            AccessDecision::Allow => {
                self.audit
                    .publish(AuditEvent::SendEntryLoginSuccess {
                        device_id: device_id.to_string(),
                        clinician_id: clinician.clinician_id.clone(),
                        send_entry_identifier: Some(send_entry_identifier.to_string()),
                    })
                    .await;

                let scope = self.scopes.get_scope(TokenRole::Clinician).await?;
                let jwt = self.issuer.issue(
                    TokenMetadata::Clinician {
                        clinician_id: clinician.clinician_id,
                        referring_device_id: device_id.to_string(),
                    },
                    scope,
                    self.config.token_ttl,
                    self.clock.now_utc(),
                )?;
                Ok(IssuedToken { jwt })
            }
        }
    }
}
