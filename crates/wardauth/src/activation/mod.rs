//! The activation state machine.
//!
//! An activation moves through `unused-fresh -> unused-stale -> used`, with
//! `attempts-exhausted` as an absorbing sub-state of unused that only patient
//! activations can reach. The two subject kinds share the expiry policy and
//! the secret generator/hasher but differ in their secret handling: patient
//! activations pair a lookup code with a hashed one-time PIN, device
//! activation codes are themselves the secret.

mod device;
mod patient;
mod service;

pub use service::{
    ActivationKind, ActivationService, Authorisation, DeviceActivationGrant, DeviceAuthorisation,
    PatientActivationGrant, PatientAuthorisation,
};
