//! Token issuance and authorisation-code exchange.
//!
//! This module provides:
//!
//! - JWT claims types and the signing-material resolution
//! - [`TokenIssuer`], a pure claims-to-token function
//! - [`TokenService`], the authorisation-code exchanges for patients,
//!   devices and clinicians

mod issuer;
mod service;

pub use issuer::{SigningKeyMaterial, TokenClaims, TokenIssuer, TokenMetadata};
pub use service::{IssuedToken, TokenService};
