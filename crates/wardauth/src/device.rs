//! Device record management.

use std::sync::Arc;

use serde::Deserialize;

use crate::AuthResult;
use crate::audit::{AuditEvent, AuditSink};
use crate::error::AuthError;
use crate::storage::{Device, DeviceStore, DeviceUpdate};

/// Fields accepted when registering a device.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    /// Caller-chosen identifier; a v4 UUID is assigned when absent.
    #[serde(default)]
    pub uuid: Option<String>,

    /// Identifier of the location that holds the device.
    pub location_id: String,

    /// Free-text description.
    pub description: String,
}

/// Maintains the device registry and audits changes to it.
pub struct DeviceService {
    devices: Arc<dyn DeviceStore>,
    audit: Arc<dyn AuditSink>,
}

impl DeviceService {
    /// Creates a device service over the given store and audit sink.
    #[must_use]
    pub fn new(devices: Arc<dyn DeviceStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { devices, audit }
    }

    /// Registers a new device.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error if a device with the same identifier
    /// already exists.
    pub async fn create(&self, new: NewDevice) -> AuthResult<Device> {
        if let Some(uuid) = &new.uuid
            && self.devices.find(uuid).await?.is_some()
        {
            return Err(AuthError::conflict(format!("device {uuid} already exists")));
        }

        let device = Device::new(new.uuid, new.location_id, new.description);
        let created = self.devices.create(&device).await?;
        tracing::info!(device_id = %created.uuid, "registered device");
        Ok(created)
    }

    /// Fetches a device by identifier.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown device.
    pub async fn get(&self, device_id: &str) -> AuthResult<Device> {
        self.devices
            .find(device_id)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("no device with id {device_id}")))
    }

    /// Applies a partial update to a device, recording an audit event
    /// naming the fields that changed.
    ///
    /// `actor` identifies the clinician performing the change, when known.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown device.
    pub async fn update(
        &self,
        device_id: &str,
        update: DeviceUpdate,
        actor: Option<&str>,
    ) -> AuthResult<Device> {
        let updated_fields: Vec<String> = update
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let updated = self.devices.update(device_id, &update).await?;

        self.audit
            .publish(AuditEvent::SendEntryDeviceUpdate {
                device_id: device_id.to_string(),
                clinician_id: actor.map(str::to_string),
                updated_fields,
            })
            .await;
        tracing::info!(device_id, "updated device");
        Ok(updated)
    }

    /// Lists devices by active flag, optionally restricted to a set of
    /// locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list(
        &self,
        active: bool,
        location_ids: Option<&[String]>,
    ) -> AuthResult<Vec<Device>> {
        self.devices.list(active, location_ids).await
    }
}
