//! Map-backed implementations of the wardauth storage traits.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use wardauth::AuthResult;
use wardauth::error::AuthError;
use wardauth::storage::{
    Clinician, ClinicianStore, ClinicianUpdate, Device, DeviceActivation, DeviceActivationStore,
    DeviceStore, DeviceUpdate, Group, Patient, PatientActivation, PatientActivationStore,
    PatientStore, Product,
};

/// In-memory store implementing every wardauth storage trait.
///
/// Each entity lives in its own `RwLock`-guarded map, so single-record
/// operations (including the attempts-count increment) are atomic.
#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<HashMap<String, Patient>>,
    devices: RwLock<HashMap<String, Device>>,
    patient_activations: RwLock<HashMap<String, PatientActivation>>,
    device_activations: RwLock<HashMap<String, DeviceActivation>>,
    clinicians: RwLock<HashMap<String, Clinician>>,
    groups: RwLock<HashMap<String, Group>>,
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn find_by_patient_id(&self, patient_id: &str) -> AuthResult<Option<Patient>> {
        Ok(self.patients.read().await.get(patient_id).cloned())
    }

    async fn create(&self, patient: &Patient) -> AuthResult<Patient> {
        let mut patients = self.patients.write().await;
        if patients.contains_key(&patient.patient_id) {
            return Err(AuthError::conflict(format!(
                "patient {} already exists",
                patient.patient_id
            )));
        }
        patients.insert(patient.patient_id.clone(), patient.clone());
        Ok(patient.clone())
    }

    async fn set_authorisation_code(
        &self,
        patient_id: &str,
        hashed_code: &[u8],
        salt: &str,
    ) -> AuthResult<()> {
        let mut patients = self.patients.write().await;
        let patient = patients
            .get_mut(patient_id)
            .ok_or_else(|| AuthError::not_found(format!("no patient with id {patient_id}")))?;
        patient.hashed_authorisation_code = Some(hashed_code.to_vec());
        patient.authorisation_code_salt = Some(salt.to_string());
        patient.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn find(&self, device_id: &str) -> AuthResult<Option<Device>> {
        Ok(self.devices.read().await.get(device_id).cloned())
    }

    async fn create(&self, device: &Device) -> AuthResult<Device> {
        let mut devices = self.devices.write().await;
        if devices.contains_key(&device.uuid) {
            return Err(AuthError::conflict(format!(
                "device {} already exists",
                device.uuid
            )));
        }
        devices.insert(device.uuid.clone(), device.clone());
        Ok(device.clone())
    }

    async fn update(&self, device_id: &str, update: &DeviceUpdate) -> AuthResult<Device> {
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(device_id)
            .ok_or_else(|| AuthError::not_found(format!("no device with id {device_id}")))?;
        if let Some(location_id) = &update.location_id {
            device.location_id = location_id.clone();
        }
        if let Some(description) = &update.description {
            device.description = description.clone();
        }
        if let Some(active) = update.active {
            device.active = active;
        }
        device.updated_at = OffsetDateTime::now_utc();
        Ok(device.clone())
    }

    async fn list(
        &self,
        active: bool,
        location_ids: Option<&[String]>,
    ) -> AuthResult<Vec<Device>> {
        let devices = self.devices.read().await;
        let mut matching: Vec<Device> = devices
            .values()
            .filter(|device| device.active == active)
            .filter(|device| {
                location_ids.is_none_or(|ids| ids.contains(&device.location_id))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(matching)
    }

    async fn set_authorisation_code(
        &self,
        device_id: &str,
        hashed_code: &[u8],
        salt: &str,
    ) -> AuthResult<()> {
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(device_id)
            .ok_or_else(|| AuthError::not_found(format!("no device with id {device_id}")))?;
        device.hashed_authorisation_code = Some(hashed_code.to_vec());
        device.authorisation_code_salt = Some(salt.to_string());
        device.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl PatientActivationStore for MemoryStore {
    async fn find_unused_by_patient(
        &self,
        patient_id: &str,
    ) -> AuthResult<Option<PatientActivation>> {
        let activations = self.patient_activations.read().await;
        Ok(activations
            .values()
            .find(|a| a.patient_id == patient_id && !a.used)
            .cloned())
    }

    async fn find_redeemable(
        &self,
        code: &str,
        max_attempts: u32,
    ) -> AuthResult<Option<PatientActivation>> {
        let activations = self.patient_activations.read().await;
        Ok(activations
            .values()
            .find(|a| a.code == code && !a.used && a.attempts_count < max_attempts)
            .cloned())
    }

    async fn insert(&self, activation: &PatientActivation) -> AuthResult<()> {
        let mut activations = self.patient_activations.write().await;
        if activations
            .values()
            .any(|a| a.code == activation.code && !a.used)
        {
            return Err(AuthError::conflict(
                "an unused activation with this code already exists",
            ));
        }
        activations.insert(activation.uuid.clone(), activation.clone());
        Ok(())
    }

    async fn refresh_secret(
        &self,
        activation_uuid: &str,
        hashed_otp: &[u8],
        otp_salt: &str,
        modified: OffsetDateTime,
    ) -> AuthResult<()> {
        let mut activations = self.patient_activations.write().await;
        let activation = activations.get_mut(activation_uuid).ok_or_else(|| {
            AuthError::not_found(format!("no activation with uuid {activation_uuid}"))
        })?;
        activation.hashed_otp = hashed_otp.to_vec();
        activation.otp_salt = otp_salt.to_string();
        activation.attempts_count = 0;
        activation.modified = modified;
        Ok(())
    }

    async fn increment_attempts(&self, activation_uuid: &str) -> AuthResult<u32> {
        let mut activations = self.patient_activations.write().await;
        let activation = activations.get_mut(activation_uuid).ok_or_else(|| {
            AuthError::not_found(format!("no activation with uuid {activation_uuid}"))
        })?;
        activation.attempts_count += 1;
        Ok(activation.attempts_count)
    }

    async fn complete(
        &self,
        activation_uuid: &str,
        used: bool,
        activated_at: OffsetDateTime,
        activated_timezone: i32,
    ) -> AuthResult<()> {
        let mut activations = self.patient_activations.write().await;
        let activation = activations.get_mut(activation_uuid).ok_or_else(|| {
            AuthError::not_found(format!("no activation with uuid {activation_uuid}"))
        })?;
        activation.used = used;
        activation.activated_timestamp = Some(activated_at);
        activation.activated_timezone = Some(activated_timezone);
        Ok(())
    }

    async fn completed_for_patient(
        &self,
        patient_id: &str,
    ) -> AuthResult<Vec<PatientActivation>> {
        let activations = self.patient_activations.read().await;
        let mut completed: Vec<PatientActivation> = activations
            .values()
            .filter(|a| a.patient_id == patient_id && a.activated_timestamp.is_some())
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.activated_timestamp.cmp(&a.activated_timestamp));
        Ok(completed)
    }
}

#[async_trait]
impl DeviceActivationStore for MemoryStore {
    async fn find_unused_by_device(
        &self,
        device_id: &str,
    ) -> AuthResult<Option<DeviceActivation>> {
        let activations = self.device_activations.read().await;
        Ok(activations
            .values()
            .find(|a| a.device_id == device_id && !a.used)
            .cloned())
    }

    async fn find_redeemable(&self, code: &str) -> AuthResult<Option<DeviceActivation>> {
        let activations = self.device_activations.read().await;
        Ok(activations
            .values()
            .find(|a| a.code == code && !a.used)
            .cloned())
    }

    async fn insert(&self, activation: &DeviceActivation) -> AuthResult<()> {
        let mut activations = self.device_activations.write().await;
        if activations
            .values()
            .any(|a| a.code == activation.code && !a.used)
        {
            return Err(AuthError::conflict(
                "an unused activation with this code already exists",
            ));
        }
        activations.insert(activation.uuid.clone(), activation.clone());
        Ok(())
    }

    async fn refresh_code(
        &self,
        activation_uuid: &str,
        code: &str,
        modified: OffsetDateTime,
    ) -> AuthResult<()> {
        let mut activations = self.device_activations.write().await;
        let activation = activations.get_mut(activation_uuid).ok_or_else(|| {
            AuthError::not_found(format!("no activation with uuid {activation_uuid}"))
        })?;
        activation.code = code.to_string();
        activation.modified = modified;
        Ok(())
    }

    async fn complete(
        &self,
        activation_uuid: &str,
        used: bool,
        activated_at: OffsetDateTime,
        activated_timezone: i32,
    ) -> AuthResult<()> {
        let mut activations = self.device_activations.write().await;
        let activation = activations.get_mut(activation_uuid).ok_or_else(|| {
            AuthError::not_found(format!("no activation with uuid {activation_uuid}"))
        })?;
        activation.used = used;
        activation.activated_timestamp = Some(activated_at);
        activation.activated_timezone = Some(activated_timezone);
        Ok(())
    }
}

#[async_trait]
impl ClinicianStore for MemoryStore {
    async fn find_by_clinician_id(&self, clinician_id: &str) -> AuthResult<Option<Clinician>> {
        Ok(self.clinicians.read().await.get(clinician_id).cloned())
    }

    async fn find_by_send_entry_identifier(
        &self,
        send_entry_identifier: &str,
    ) -> AuthResult<Option<Clinician>> {
        let clinicians = self.clinicians.read().await;
        Ok(clinicians
            .values()
            .find(|c| c.send_entry_identifier.as_deref() == Some(send_entry_identifier))
            .cloned())
    }

    async fn create(&self, clinician: &Clinician) -> AuthResult<Clinician> {
        let mut clinicians = self.clinicians.write().await;
        if clinicians.contains_key(&clinician.clinician_id) {
            return Err(AuthError::conflict(format!(
                "clinician {} already exists",
                clinician.clinician_id
            )));
        }
        clinicians.insert(clinician.clinician_id.clone(), clinician.clone());
        Ok(clinician.clone())
    }

    async fn update(
        &self,
        clinician_id: &str,
        update: &ClinicianUpdate,
    ) -> AuthResult<Clinician> {
        let mut clinicians = self.clinicians.write().await;
        let clinician = clinicians
            .get_mut(clinician_id)
            .ok_or_else(|| AuthError::not_found(format!("no clinician with id {clinician_id}")))?;
        if let Some(active) = update.login_active {
            clinician.login_active = active;
        }
        clinician.send_entry_identifier = update.send_entry_identifier.clone();
        clinician.contract_expiry_eod_date = update.contract_expiry_eod_date;
        clinician.groups = update.groups.clone();
        clinician.products = update.products.clone();
        clinician.updated_at = OffsetDateTime::now_utc();
        Ok(clinician.clone())
    }

    async fn set_login_active(&self, clinician_id: &str, active: bool) -> AuthResult<()> {
        let mut clinicians = self.clinicians.write().await;
        let clinician = clinicians
            .get_mut(clinician_id)
            .ok_or_else(|| AuthError::not_found(format!("no clinician with id {clinician_id}")))?;
        clinician.login_active = active;
        clinician.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn get_or_create_group(&self, name: &str) -> AuthResult<Group> {
        let mut groups = self.groups.write().await;
        if let Some(group) = groups.get(name) {
            return Ok(group.clone());
        }
        let group = Group {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        groups.insert(name.to_string(), group.clone());
        Ok(group)
    }

    async fn get_or_create_product(&self, name: &str) -> AuthResult<Product> {
        let mut products = self.products.write().await;
        if let Some(product) = products.get(name) {
            return Ok(product.clone());
        }
        let product = Product {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        products.insert(name.to_string(), product.clone());
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[tokio::test]
    async fn test_patient_create_rejects_duplicates() {
        let store = MemoryStore::new();
        let patient = Patient::new("abc123");
        PatientStore::create(&store, &patient).await.unwrap();

        let err = PatientStore::create(&store, &Patient::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_redeemable_excludes_exhausted_activations() {
        let store = MemoryStore::new();
        let now = datetime!(2020-06-01 10:00:00 UTC);
        let activation = PatientActivation::new("abc123", "CODE", vec![1], "SALT", now);
        PatientActivationStore::insert(&store, &activation).await.unwrap();

        for _ in 0..10 {
            store.increment_attempts(&activation.uuid).await.unwrap();
        }
        let found = PatientActivationStore::find_redeemable(&store, "CODE", 10)
            .await
            .unwrap();
        assert!(found.is_none());

        let found = PatientActivationStore::find_redeemable(&store, "CODE", 11)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_refresh_secret_resets_attempts() {
        let store = MemoryStore::new();
        let now = datetime!(2020-06-01 10:00:00 UTC);
        let activation = PatientActivation::new("abc123", "CODE", vec![1], "SALT", now);
        PatientActivationStore::insert(&store, &activation).await.unwrap();
        store.increment_attempts(&activation.uuid).await.unwrap();

        let later = datetime!(2020-06-02 10:00:00 UTC);
        store
            .refresh_secret(&activation.uuid, &[2], "SALT2", later)
            .await
            .unwrap();

        let refreshed = store.find_unused_by_patient("abc123").await.unwrap().unwrap();
        assert_eq!(refreshed.attempts_count, 0);
        assert_eq!(refreshed.modified, later);
        assert_eq!(refreshed.hashed_otp, vec![2]);
    }

    #[tokio::test]
    async fn test_completed_activations_newest_first() {
        let store = MemoryStore::new();
        let now = datetime!(2020-06-01 10:00:00 UTC);

        let first = PatientActivation::new("abc123", "CODE1", vec![1], "SALT", now);
        PatientActivationStore::insert(&store, &first).await.unwrap();
        PatientActivationStore::complete(&store, &first.uuid, true, datetime!(2020-06-02 09:00:00 UTC), 0)
            .await
            .unwrap();

        let second = PatientActivation::new("abc123", "CODE2", vec![1], "SALT", now);
        PatientActivationStore::insert(&store, &second).await.unwrap();
        PatientActivationStore::complete(&store, &second.uuid, true, datetime!(2020-06-03 09:00:00 UTC), 0)
            .await
            .unwrap();

        let history = store.completed_for_patient("abc123").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].uuid, second.uuid);
        assert_eq!(history[1].uuid, first.uuid);
    }

    #[tokio::test]
    async fn test_device_list_filters_by_location() {
        let store = MemoryStore::new();
        let ward_3 = Device::new(None, "ward-3", "tablet A");
        let ward_4 = Device::new(None, "ward-4", "tablet B");
        DeviceStore::create(&store, &ward_3).await.unwrap();
        DeviceStore::create(&store, &ward_4).await.unwrap();

        let locations = vec!["ward-3".to_string()];
        let listed = DeviceStore::list(&store, true, Some(&locations)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].uuid, ward_3.uuid);

        let all = DeviceStore::list(&store, true, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_clinician_update_replaces_memberships() {
        let store = MemoryStore::new();
        let mut clinician = Clinician::new("c-1", true);
        clinician.groups = vec!["send clinician".to_string()];
        ClinicianStore::create(&store, &clinician).await.unwrap();

        let update = ClinicianUpdate {
            groups: vec!["send superclinician".to_string()],
            ..ClinicianUpdate::default()
        };
        let updated = ClinicianStore::update(&store, "c-1", &update).await.unwrap();
        assert_eq!(updated.groups, vec!["send superclinician".to_string()]);
        assert!(updated.login_active);
    }
}
