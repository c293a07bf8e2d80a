//! Security event audit publication.
//!
//! Every authorisation outcome for SEND entry actors is published to an
//! [`AuditSink`] before being reported to the caller. Publication is
//! fire-and-forget: the sink never fails the calling operation.

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// An auditable security event.
///
/// The event-type strings are fixed and consumed downstream; do not change
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// A clinician obtained a SEND entry token.
    SendEntryLoginSuccess {
        /// Device the clinician logged in from.
        device_id: String,
        /// The clinician's identifier.
        clinician_id: String,
        /// The clinician's SEND entry identifier.
        send_entry_identifier: Option<String>,
    },

    /// A clinician was refused a SEND entry token.
    SendEntryLoginFailure {
        /// Device the clinician attempted to log in from.
        device_id: String,
        /// Why the login was refused.
        reason: String,
        /// The SEND entry identifier presented.
        send_entry_identifier: String,
        /// The clinician's identifier, when the identifier resolved.
        clinician_id: Option<String>,
    },

    /// A device exchanged its authorisation code for a token.
    SendEntryDeviceAuthSuccess {
        /// The device's identifier.
        device_id: String,
    },

    /// A device was refused a token.
    SendEntryDeviceAuthFailure {
        /// The device's identifier.
        device_id: String,
        /// Why the exchange was refused.
        reason: String,
    },

    /// A device record was updated.
    SendEntryDeviceUpdate {
        /// The device's identifier.
        device_id: String,
        /// Who performed the update, when known.
        clinician_id: Option<String>,
        /// Names of the updated fields.
        updated_fields: Vec<String>,
    },
}

impl AuditEvent {
    /// Returns the fixed event-type string.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SendEntryLoginSuccess { .. } => "SEND entry login success",
            Self::SendEntryLoginFailure { .. } => "SEND entry login failure",
            Self::SendEntryDeviceAuthSuccess { .. } => "SEND entry device auth success",
            Self::SendEntryDeviceAuthFailure { .. } => "SEND entry device auth failed",
            Self::SendEntryDeviceUpdate { .. } => "SEND entry device update",
        }
    }

    /// Returns the structured event payload.
    #[must_use]
    pub fn event_data(&self) -> Value {
        match self {
            Self::SendEntryLoginSuccess {
                device_id,
                clinician_id,
                send_entry_identifier,
            } => {
                let mut data = json!({
                    "device_id": device_id,
                    "clinician_id": clinician_id,
                });
                if let Some(identifier) = send_entry_identifier {
                    data["send_entry_identifier"] = json!(identifier);
                }
                data
            }
            Self::SendEntryLoginFailure {
                device_id,
                reason,
                send_entry_identifier,
                clinician_id,
            } => {
                let mut data = json!({
                    "device_id": device_id,
                    "reason": reason,
                    "send_entry_identifier": send_entry_identifier,
                });
                if let Some(id) = clinician_id {
                    data["clinician_id"] = json!(id);
                }
                data
            }
            Self::SendEntryDeviceAuthSuccess { device_id } => {
                json!({ "device_id": device_id })
            }
            Self::SendEntryDeviceAuthFailure { device_id, reason } => {
                json!({ "device_id": device_id, "reason": reason })
            }
            Self::SendEntryDeviceUpdate {
                device_id,
                clinician_id,
                updated_fields,
            } => {
                json!({
                    "device_id": device_id,
                    "clinician_id": clinician_id,
                    "updated_fields": updated_fields,
                })
            }
        }
    }
}

/// Fire-and-forget publication of audit events.
///
/// Implementations forward events to the platform audit pipeline. Publication
/// must not fail the calling operation; sinks swallow and log their own
/// delivery errors.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Publishes an event.
    async fn publish(&self, event: AuditEvent);
}

/// [`AuditSink`] that emits events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn publish(&self, event: AuditEvent) {
        tracing::info!(
            event_type = event.event_type(),
            event_data = %event.event_data(),
            "audit event"
        );
    }
}

/// [`AuditSink`] that records events in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events, oldest first.
    pub async fn recorded(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn publish(&self, event: AuditEvent) {
        self.events.lock().await.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_strings() {
        let event = AuditEvent::SendEntryLoginFailure {
            device_id: "d-1".to_string(),
            reason: "Clinician contract expired".to_string(),
            send_entry_identifier: "666123".to_string(),
            clinician_id: Some("c-1".to_string()),
        };
        assert_eq!(event.event_type(), "SEND entry login failure");

        let event = AuditEvent::SendEntryDeviceAuthFailure {
            device_id: "d-1".to_string(),
            reason: "Device has not been activated".to_string(),
        };
        assert_eq!(event.event_type(), "SEND entry device auth failed");
    }

    #[test]
    fn test_login_failure_payload_omits_missing_clinician() {
        let event = AuditEvent::SendEntryLoginFailure {
            device_id: "d-1".to_string(),
            reason: "no such clinician".to_string(),
            send_entry_identifier: "666123".to_string(),
            clinician_id: None,
        };
        let data = event.event_data();
        assert_eq!(data["device_id"], "d-1");
        assert_eq!(data["send_entry_identifier"], "666123");
        assert!(data.get("clinician_id").is_none());
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingAuditSink::new();
        sink.publish(AuditEvent::SendEntryDeviceAuthSuccess {
            device_id: "d-1".to_string(),
        })
        .await;

        let events = sink.recorded().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "SEND entry device auth success");
    }
}
