//! Clinician record management.
//!
//! Clinician data is mastered elsewhere in the platform; this service keeps
//! the local copy that drives SEND entry access decisions in sync. Group
//! and product names are normalised to lowercase before being stored so
//! membership checks never depend on the caller's casing.

use std::sync::Arc;

use serde::Deserialize;
use time::Date;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Clinician, ClinicianStore, ClinicianUpdate};

/// Fields accepted when registering a clinician.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClinician {
    /// Externally assigned clinician identifier.
    pub clinician_id: String,

    /// Whether the clinician may log in.
    pub login_active: bool,

    /// SEND entry identifier, if the clinician has one.
    #[serde(default)]
    pub send_entry_identifier: Option<String>,

    /// Contract expiry date for temporary staff.
    #[serde(default)]
    pub contract_expiry_eod_date: Option<Date>,

    /// Names of groups the clinician belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Names of products the clinician is associated with.
    #[serde(default)]
    pub products: Vec<String>,
}

/// Maintains the local clinician registry.
pub struct ClinicianService {
    clinicians: Arc<dyn ClinicianStore>,
}

impl ClinicianService {
    /// Creates a clinician service over the given store.
    #[must_use]
    pub fn new(clinicians: Arc<dyn ClinicianStore>) -> Self {
        Self { clinicians }
    }

    /// Registers a new clinician.
    ///
    /// Group and product tags are created on first use.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error if a clinician with the same
    /// `clinician_id` already exists.
    pub async fn create(&self, new: NewClinician) -> AuthResult<Clinician> {
        if self
            .clinicians
            .find_by_clinician_id(&new.clinician_id)
            .await?
            .is_some()
        {
            return Err(AuthError::conflict(format!(
                "clinician {} already exists",
                new.clinician_id
            )));
        }

        let mut clinician = Clinician::new(&new.clinician_id, new.login_active);
        clinician.send_entry_identifier = new.send_entry_identifier;
        clinician.contract_expiry_eod_date = new.contract_expiry_eod_date;
        clinician.groups = self.normalise_groups(&new.groups).await?;
        clinician.products = self.normalise_products(&new.products).await?;

        let created = self.clinicians.create(&clinician).await?;
        tracing::info!(clinician_id = %created.clinician_id, "registered clinician");
        Ok(created)
    }

    /// Applies a partial update to an existing clinician.
    ///
    /// Group and product memberships are replaced wholesale with the
    /// normalised names from `update`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown clinician.
    pub async fn update(
        &self,
        clinician_id: &str,
        mut update: ClinicianUpdate,
    ) -> AuthResult<Clinician> {
        update.groups = self.normalise_groups(&update.groups).await?;
        update.products = self.normalise_products(&update.products).await?;

        let updated = self.clinicians.update(clinician_id, &update).await?;
        tracing::info!(clinician_id, "updated clinician");
        Ok(updated)
    }

    /// Fetches a clinician by external identifier.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown clinician.
    pub async fn get(&self, clinician_id: &str) -> AuthResult<Clinician> {
        self.clinicians
            .find_by_clinician_id(clinician_id)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("no clinician with id {clinician_id}")))
    }

    async fn normalise_groups(&self, names: &[String]) -> AuthResult<Vec<String>> {
        let mut groups = Vec::with_capacity(names.len());
        for name in names {
            let group = self.clinicians.get_or_create_group(&name.to_lowercase()).await?;
            groups.push(group.name);
        }
        Ok(groups)
    }

    async fn normalise_products(&self, names: &[String]) -> AuthResult<Vec<String>> {
        let mut products = Vec::with_capacity(names.len());
        for name in names {
            let product = self
                .clinicians
                .get_or_create_product(&name.to_lowercase())
                .await?;
            products.push(product.name);
        }
        Ok(products)
    }
}
