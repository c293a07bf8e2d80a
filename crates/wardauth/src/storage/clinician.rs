//! Clinician, group and product records and storage trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::AuthResult;

/// A clinician known to the activation authority.
///
/// The `clinician_id` correlates with the clinician's identity in the wider
/// platform; the `uuid` is specific to this store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinician {
    /// Row identifier, unique to this store.
    pub uuid: String,

    /// Externally assigned clinician identifier, unique.
    pub clinician_id: String,

    /// Whether the clinician may currently log in.
    pub login_active: bool,

    /// The clinician's SEND entry identifier, used for token exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_entry_identifier: Option<String>,

    /// Date the clinician's contract expires, end of day. Temporary staff
    /// have their login lazily deactivated once this passes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_expiry_eod_date: Option<Date>,

    /// Lowercase names of the groups the clinician belongs to.
    pub groups: Vec<String>,

    /// Lowercase names of the products the clinician is associated with.
    pub products: Vec<String>,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Clinician {
    /// Creates a new clinician with the given identifier and login state.
    #[must_use]
    pub fn new(clinician_id: impl Into<String>, login_active: bool) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            clinician_id: clinician_id.into(),
            login_active,
            send_entry_identifier: None,
            contract_expiry_eod_date: None,
            groups: Vec::new(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the clinician belongs to `group`, compared
    /// case-insensitively.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }
}

/// A partial clinician update.
///
/// Group and product memberships are always replaced wholesale;
/// `send_entry_identifier` and `contract_expiry_eod_date` are replaced with
/// the provided value (clearing on `None`); `login_active` is only changed
/// when present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClinicianUpdate {
    /// New login state, unchanged when `None`.
    pub login_active: Option<bool>,

    /// Replacement SEND entry identifier.
    pub send_entry_identifier: Option<String>,

    /// Replacement contract expiry date.
    pub contract_expiry_eod_date: Option<Date>,

    /// Replacement group memberships (lowercase names).
    pub groups: Vec<String>,

    /// Replacement product memberships (lowercase names).
    pub products: Vec<String>,
}

/// A name-keyed clinician group tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Row identifier.
    pub uuid: String,

    /// Lowercase group name, unique.
    pub name: String,
}

/// A name-keyed product tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Row identifier.
    pub uuid: String,

    /// Lowercase product name, unique.
    pub name: String,
}

/// Storage operations for clinicians and their membership tags.
#[async_trait]
pub trait ClinicianStore: Send + Sync {
    /// Finds a clinician by external identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_clinician_id(&self, clinician_id: &str) -> AuthResult<Option<Clinician>>;

    /// Finds a clinician by SEND entry identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_send_entry_identifier(
        &self,
        send_entry_identifier: &str,
    ) -> AuthResult<Option<Clinician>>;

    /// Creates a new clinician.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error if a clinician with the same
    /// `clinician_id` already exists, or an error if the storage operation
    /// fails.
    async fn create(&self, clinician: &Clinician) -> AuthResult<Clinician>;

    /// Applies a partial update to a clinician.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The clinician doesn't exist
    /// - The storage operation fails
    async fn update(&self, clinician_id: &str, update: &ClinicianUpdate)
    -> AuthResult<Clinician>;

    /// Persists a login-active flip.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The clinician doesn't exist
    /// - The storage operation fails
    async fn set_login_active(&self, clinician_id: &str, active: bool) -> AuthResult<()>;

    /// Returns the group with the given lowercase name, creating it if
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_or_create_group(&self, name: &str) -> AuthResult<Group>;

    /// Returns the product with the given lowercase name, creating it if
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_or_create_product(&self, name: &str) -> AuthResult<Product>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_group_is_case_insensitive() {
        let mut clinician = Clinician::new("c-1", true);
        clinician.groups = vec!["send clinician".to_string()];

        assert!(clinician.in_group("SEND Clinician"));
        assert!(clinician.in_group("send clinician"));
        assert!(!clinician.in_group("send superclinician"));
    }
}
