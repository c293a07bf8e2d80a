//! Token scope resolution.
//!
//! Scopes are maintained by an external directory and mirrored into a fast
//! cache; this module only reads the cache. In production a cache miss fails
//! closed with `ServiceUnavailable`. Outside production a configured mock
//! scope is used instead, so demo environments keep working without the
//! directory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::config::{Environment, MockScopes};
use crate::error::AuthError;

/// The role a token is issued for, determining its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRole {
    /// A patient submitting their own readings.
    Patient,
    /// A clinician entering observations through SEND entry.
    Clinician,
    /// A SEND entry ward device.
    Device,
}

impl TokenRole {
    /// Cache key the role's scope is mirrored under.
    #[must_use]
    pub fn cache_key(self) -> &'static str {
        match self {
            Self::Patient => "CACHED_GDM_PATIENT_SCOPE",
            Self::Clinician => "CACHED_SEND_ENTRY_CLINICIAN_SCOPE",
            Self::Device => "CACHED_SEND_ENTRY_DEVICE_SCOPE",
        }
    }

    /// Human-readable name of the directory group the scope comes from.
    #[must_use]
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Patient => "GDM Patient",
            Self::Clinician => "SEND Entry Clinician",
            Self::Device => "SEND Entry Device",
        }
    }
}

/// Read access to the external scope cache.
#[async_trait]
pub trait ScopeCache: Send + Sync {
    /// Looks up a cached scope string.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache is unreachable.
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;
}

/// Resolves token scopes with environment-appropriate fallback.
pub struct ScopeService {
    cache: Arc<dyn ScopeCache>,
    mock_scopes: MockScopes,
    environment: Environment,
}

impl ScopeService {
    /// Creates a scope service over the given cache.
    #[must_use]
    pub fn new(cache: Arc<dyn ScopeCache>, mock_scopes: MockScopes, environment: Environment) -> Self {
        Self {
            cache,
            mock_scopes,
            environment,
        }
    }

    /// Resolves the scope string for a role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` when the cache has no value and either
    /// the environment is production or no mock scope is configured for the
    /// role.
    pub async fn get_scope(&self, role: TokenRole) -> AuthResult<String> {
        let cached = match self.cache.get(role.cache_key()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(role = role.group_name(), error = %e, "scope cache lookup failed");
                None
            }
        };

        if let Some(scope) = cached {
            return Ok(scope);
        }

        if self.environment.is_production() {
            return Err(AuthError::service_unavailable(format!(
                "could not retrieve {} scope from cache",
                role.group_name()
            )));
        }

        let mock = match role {
            TokenRole::Patient => self.mock_scopes.patient.as_ref(),
            TokenRole::Clinician => self.mock_scopes.clinician.as_ref(),
            TokenRole::Device => self.mock_scopes.device.as_ref(),
        };

        match mock {
            Some(scope) => {
                tracing::warn!(
                    role = role.group_name(),
                    "could not retrieve scope from cache, falling back to mock"
                );
                Ok(scope.clone())
            }
            None => Err(AuthError::service_unavailable(format!(
                "could not retrieve {} scope and no mock scope is configured",
                role.group_name()
            ))),
        }
    }
}
