//! Storage traits for subjects, activations and clinicians.
//!
//! This module defines the persistence interfaces the services depend on:
//!
//! - Patients and their authorisation-code digests
//! - Devices and their authorisation-code digests
//! - Patient and device activation records
//! - Clinicians with group and product memberships
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `wardauth-store-memory` - in-memory backend for tests and demos
//!
//! Implementations must enforce unique constraints on subject identifiers and
//! activation codes, and the read-modify-write operations (`increment_attempts`,
//! `complete`) must be atomic per record.

pub mod activation;
pub mod clinician;
pub mod device;
pub mod patient;

pub use activation::{
    DeviceActivation, DeviceActivationStore, PatientActivation, PatientActivationStore,
};
pub use clinician::{Clinician, ClinicianStore, ClinicianUpdate, Group, Product};
pub use device::{Device, DeviceStore, DeviceUpdate};
pub use patient::{Patient, PatientStore};
