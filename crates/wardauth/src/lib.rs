//! # wardauth
//!
//! Activation and token authority for ward devices and patients.
//!
//! This crate provides:
//! - One-time activation flows for patients (activation code + PIN) and
//!   ward devices (numeric activation code)
//! - scrypt-hashed secret storage with end-of-day expiry and retry limits
//! - JWT issuance (RS256 or HS512) for patients, clinicians and devices
//! - Clinician SEND entry access decisions with lazy contract-expiry
//!   reconciliation
//! - Audit events for logins, device auth and device changes
//! - Scope resolution with a fail-closed production posture
//!
//! ## Modules
//!
//! - [`access`] - SEND entry access decision for clinicians
//! - [`activation`] - Activation creation and validation flows
//! - [`audit`] - Audit events and sink trait
//! - [`clinician`] - Clinician registry service
//! - [`config`] - Authority configuration
//! - [`device`] - Device registry service
//! - [`error`] - Error taxonomy
//! - [`expiry`] - Clock trait and end-of-day expiry arithmetic
//! - [`hash`] - scrypt digest derivation and comparison
//! - [`scope`] - Token scope resolution
//! - [`secret`] - Random secret generation
//! - [`static_ids`] - Static test subjects for non-production environments
//! - [`storage`] - Storage traits and entity records
//! - [`token`] - Token signing and exchange flows

pub mod access;
pub mod activation;
pub mod audit;
pub mod clinician;
pub mod config;
pub mod device;
pub mod error;
pub mod expiry;
pub mod hash;
pub mod scope;
pub mod secret;
pub mod static_ids;
pub mod storage;
pub mod token;

pub use access::{AccessDecision, DenyReason};
pub use activation::{
    ActivationKind, ActivationService, Authorisation, DeviceActivationGrant, DeviceAuthorisation,
    PatientActivationGrant, PatientAuthorisation,
};
pub use audit::{AuditEvent, AuditSink, RecordingAuditSink, TracingAuditSink};
pub use clinician::{ClinicianService, NewClinician};
pub use config::{AuthConfig, Environment, MockScopes, SigningConfig};
pub use device::{DeviceService, NewDevice};
pub use error::{AuthError, ErrorCategory};
pub use expiry::{Clock, SystemClock};
pub use scope::{ScopeCache, ScopeService, TokenRole};
pub use token::{IssuedToken, TokenIssuer, TokenService};

/// Result alias for fallible authority operations.
pub type AuthResult<T> = Result<T, AuthError>;
