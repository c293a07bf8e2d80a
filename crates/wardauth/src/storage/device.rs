//! Device record and storage trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// A ward device (observation-entry tablet) known to the authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier, unique.
    pub uuid: String,

    /// Identifier of the location that holds the device.
    pub location_id: String,

    /// Free-text description of the device.
    pub description: String,

    /// scrypt digest of the current authorisation code. Set on the first
    /// successful activation and overwritten on every subsequent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_authorisation_code: Option<Vec<u8>>,

    /// Salt the authorisation-code digest was derived under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorisation_code_salt: Option<String>,

    /// Whether the device may obtain tokens. Deactivated devices keep their
    /// records but fail token exchange.
    pub active: bool,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Device {
    /// Creates a new active device.
    ///
    /// When `uuid` is `None` a fresh v4 UUID is assigned.
    #[must_use]
    pub fn new(
        uuid: Option<String>,
        location_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            uuid: uuid.unwrap_or_else(|| ::uuid::Uuid::new_v4().to_string()),
            location_id: location_id.into(),
            description: description.into(),
            hashed_authorisation_code: None,
            authorisation_code_salt: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial device update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceUpdate {
    /// New holding location.
    pub location_id: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// Activate or deactivate the device.
    pub active: Option<bool>,
}

impl DeviceUpdate {
    /// Names of the fields this update touches, for audit payloads.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.location_id.is_some() {
            fields.push("location_id");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.active.is_some() {
            fields.push("active");
        }
        fields
    }
}

/// Storage operations for devices.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Finds a device by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, device_id: &str) -> AuthResult<Option<Device>>;

    /// Creates a new device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A device with the same identifier already exists
    /// - The storage operation fails
    async fn create(&self, device: &Device) -> AuthResult<Device>;

    /// Applies a partial update to a device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - The storage operation fails
    async fn update(&self, device_id: &str, update: &DeviceUpdate) -> AuthResult<Device>;

    /// Lists devices by active flag, optionally restricted to a set of
    /// locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self, active: bool, location_ids: Option<&[String]>)
    -> AuthResult<Vec<Device>>;

    /// Stores a new authorisation-code digest and salt for a device,
    /// overwriting any previous pair.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - The storage operation fails
    async fn set_authorisation_code(
        &self,
        device_id: &str,
        hashed_code: &[u8],
        salt: &str,
    ) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_defaults() {
        let device = Device::new(None, "ward-3", "Jon's tablet");
        assert!(device.active);
        assert!(device.hashed_authorisation_code.is_none());
        assert!(!device.uuid.is_empty());

        let device = Device::new(Some("fixed-id".to_string()), "ward-3", "tablet");
        assert_eq!(device.uuid, "fixed-id");
    }

    #[test]
    fn test_update_field_names() {
        let update = DeviceUpdate {
            description: Some("renamed".to_string()),
            active: Some(false),
            ..DeviceUpdate::default()
        };
        assert_eq!(update.field_names(), vec!["description", "active"]);
        assert!(DeviceUpdate::default().field_names().is_empty());
    }
}
