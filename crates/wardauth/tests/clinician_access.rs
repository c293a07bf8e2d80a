//! Clinician login, group membership and contract-expiry reconciliation.

mod common;

use time::macros::{date, datetime};

use wardauth::audit::AuditEvent;
use wardauth::clinician::NewClinician;
use wardauth::config::Environment;
use wardauth::error::AuthError;
use wardauth::storage::ClinicianStore;
use wardauth::token::TokenMetadata;

use common::Harness;

fn send_clinician(identifier: &str) -> NewClinician {
    NewClinician {
        clinician_id: format!("clinician-{identifier}"),
        login_active: true,
        send_entry_identifier: Some(identifier.to_string()),
        contract_expiry_eod_date: None,
        groups: vec!["SEND Clinician".to_string()],
        products: vec!["SEND".to_string()],
    }
}

#[tokio::test]
async fn clinician_login_issues_token() {
    let harness = Harness::new(Environment::Development);
    harness
        .clinicians
        .create(send_clinician("666123"))
        .await
        .unwrap();

    let token = harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap();

    let mut validation =
        jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS512);
    validation.set_audience(&[common::ISSUER]);
    validation.set_issuer(&[common::ISSUER]);
    validation.validate_exp = false;
    let claims = jsonwebtoken::decode::<wardauth::token::TokenClaims>(
        &token.jwt,
        &jsonwebtoken::DecodingKey::from_secret(common::HS_KEY.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;
    assert_eq!(
        claims.metadata,
        TokenMetadata::Clinician {
            clinician_id: "clinician-666123".to_string(),
            referring_device_id: "device-1".to_string(),
        }
    );
    assert_eq!(claims.scope, "read:send_clinician");

    let recorded = harness.audit.recorded().await;
    assert!(recorded.iter().any(|e| matches!(
        e,
        AuditEvent::SendEntryLoginSuccess { clinician_id, .. }
            if clinician_id == "clinician-666123"
    )));
}

#[tokio::test]
async fn unknown_identifier_is_not_found_and_audited() {
    let harness = Harness::new(Environment::Development);

    let err = harness
        .tokens
        .clinician_token("999999", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound { .. }));

    let recorded = harness.audit.recorded().await;
    assert!(recorded.iter().any(|e| matches!(
        e,
        AuditEvent::SendEntryLoginFailure { clinician_id: None, reason, .. }
            if reason == "Clinician with provided SEND entry identifier not found"
    )));
}

#[tokio::test]
async fn administrators_are_not_send_entry_users() {
    let harness = Harness::new(Environment::Development);
    let mut new = send_clinician("666123");
    new.groups = vec!["SEND Administrator".to_string()];
    harness.clinicians.create(new).await.unwrap();

    let err = harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied { .. }));

    let recorded = harness.audit.recorded().await;
    assert!(recorded.iter().any(|e| matches!(
        e,
        AuditEvent::SendEntryLoginFailure { reason, .. }
            if reason == "Clinician is not authorised to access SEND entry"
    )));
}

#[tokio::test]
async fn superclinicians_are_allowed() {
    let harness = Harness::new(Environment::Development);
    let mut new = send_clinician("666123");
    new.groups = vec!["SEND Superclinician".to_string()];
    harness.clinicians.create(new).await.unwrap();

    harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_contract_deactivates_login_durably() {
    // The fixed clock reads 2020-06-01.
    let harness = Harness::new(Environment::Development);
    let mut new = send_clinician("666123");
    new.contract_expiry_eod_date = Some(date!(2020 - 05 - 31));
    harness.clinicians.create(new).await.unwrap();

    let err = harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied { .. }));

    let stored = harness
        .store
        .find_by_clinician_id("clinician-666123")
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.login_active);

    let recorded = harness.audit.recorded().await;
    assert!(recorded.iter().any(|e| matches!(
        e,
        AuditEvent::SendEntryLoginFailure { reason, clinician_id: Some(id), .. }
            if reason == "Clinician contract expired" && id == "clinician-666123"
    )));
}

#[tokio::test]
async fn contract_is_valid_through_its_expiry_day() {
    let harness = Harness::new(Environment::Development);
    let mut new = send_clinician("666123");
    new.contract_expiry_eod_date = Some(date!(2020 - 06 - 01));
    harness.clinicians.create(new).await.unwrap();

    harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap();

    harness.clock.set(datetime!(2020-06-02 00:00:01 UTC));
    let err = harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied { .. }));
}

#[tokio::test]
async fn inactive_login_is_denied_without_reconciliation() {
    let harness = Harness::new(Environment::Development);
    let mut new = send_clinician("666123");
    new.login_active = false;
    harness.clinicians.create(new).await.unwrap();

    let err = harness
        .tokens
        .clinician_token("666123", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied { .. }));
}

#[tokio::test]
async fn duplicate_clinician_registration_conflicts() {
    let harness = Harness::new(Environment::Development);
    harness
        .clinicians
        .create(send_clinician("666123"))
        .await
        .unwrap();

    let err = harness
        .clinicians
        .create(send_clinician("666123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict { .. }));
}

#[tokio::test]
async fn group_names_are_stored_lowercase() {
    let harness = Harness::new(Environment::Development);
    let created = harness
        .clinicians
        .create(send_clinician("666123"))
        .await
        .unwrap();
    assert_eq!(created.groups, vec!["send clinician".to_string()]);
    assert_eq!(created.products, vec!["send".to_string()]);
}

#[tokio::test]
async fn device_updates_are_audited_with_field_names() {
    let harness = Harness::new(Environment::Development);
    let device = harness
        .devices
        .create(wardauth::device::NewDevice {
            uuid: None,
            location_id: "ward-3".to_string(),
            description: "obs tablet".to_string(),
        })
        .await
        .unwrap();

    harness
        .devices
        .update(
            &device.uuid,
            wardauth::storage::DeviceUpdate {
                description: Some("renamed tablet".to_string()),
                active: Some(false),
                ..Default::default()
            },
            Some("clinician-666123"),
        )
        .await
        .unwrap();

    let recorded = harness.audit.recorded().await;
    assert!(recorded.iter().any(|e| matches!(
        e,
        AuditEvent::SendEntryDeviceUpdate { clinician_id: Some(actor), updated_fields, .. }
            if actor == "clinician-666123"
                && *updated_fields == vec!["description".to_string(), "active".to_string()]
    )));
}
