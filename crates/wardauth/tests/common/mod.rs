//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::macros::datetime;

use wardauth::activation::ActivationService;
use wardauth::audit::RecordingAuditSink;
use wardauth::clinician::ClinicianService;
use wardauth::config::{AuthConfig, Environment, MockScopes, SigningConfig};
use wardauth::device::DeviceService;
use wardauth::expiry::Clock;
use wardauth::scope::ScopeService;
use wardauth::token::{TokenIssuer, TokenService};
use wardauth_store_memory::{MemoryScopeCache, MemoryStore};

pub const HS_KEY: &str = "integration-test-signing-key";
pub const ISSUER: &str = "https://auth.example.com";

/// A clock frozen at a settable instant.
pub struct TestClock {
    now: Mutex<OffsetDateTime>,
}

impl TestClock {
    pub fn starting_at(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}

pub fn test_config(environment: Environment) -> AuthConfig {
    AuthConfig {
        issuer: ISSUER.to_string(),
        environment,
        signing: SigningConfig {
            rsa_private_key_pem: None,
            hs_key: Some(HS_KEY.to_string()),
        },
        mock_scopes: MockScopes {
            patient: Some("read:gdm_patient_abbreviated".to_string()),
            clinician: Some("read:send_clinician".to_string()),
            device: Some("read:send_device".to_string()),
        },
        ..AuthConfig::default()
    }
}

/// Every service wired over a shared in-memory store.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryScopeCache>,
    pub audit: Arc<RecordingAuditSink>,
    pub clock: Arc<TestClock>,
    pub activations: ActivationService,
    pub tokens: TokenService,
    pub clinicians: ClinicianService,
    pub devices: DeviceService,
}

impl Harness {
    pub fn new(environment: Environment) -> Self {
        Self::with_config(test_config(environment))
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryScopeCache::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let clock = Arc::new(TestClock::starting_at(datetime!(2020-06-01 10:00:00 UTC)));

        let activations = ActivationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            config.clone(),
            clock.clone(),
        );
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let scopes = ScopeService::new(
            cache.clone(),
            config.mock_scopes.clone(),
            config.environment,
        );
        let tokens = TokenService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            issuer,
            scopes,
            audit.clone(),
            config.clone(),
            clock.clone(),
        );
        let clinicians = ClinicianService::new(store.clone());
        let devices = DeviceService::new(store.clone(), audit.clone());

        Self {
            store,
            cache,
            audit,
            clock,
            activations,
            tokens,
            clinicians,
            devices,
        }
    }
}
