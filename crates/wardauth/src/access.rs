//! Clinician access decision for SEND entry token exchange.
//!
//! The decision is pure: contract reconciliation is reported alongside the
//! decision rather than hidden inside a read path, and the caller persists
//! the flip before acting on the outcome.

use time::Date;

use crate::storage::Clinician;

/// Groups whose members may obtain SEND entry clinician tokens.
pub const SEND_ENTRY_GROUPS: [&str; 2] = ["send clinician", "send superclinician"];

/// Outcome of evaluating a clinician's access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The clinician may obtain a token.
    Allow,
    /// The clinician may not obtain a token.
    Deny(DenyReason),
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The clinician's login is inactive, possibly because their contract
    /// has just expired.
    InactiveLogin,
    /// The clinician belongs to none of the SEND entry groups.
    NotAuthorised,
}

/// Returns `true` if the clinician belongs to a SEND entry group,
/// compared case-insensitively.
#[must_use]
pub fn has_send_entry_access(clinician: &Clinician) -> bool {
    SEND_ENTRY_GROUPS
        .iter()
        .any(|group| clinician.in_group(group))
}

/// Evaluates a clinician's access as of `today`, reconciling an expired
/// contract.
///
/// When the contract expiry date has passed and the login is still active,
/// the returned clinician carries `login_active = false` and the caller must
/// persist it before reporting the decision. `None` means no reconciliation
/// is needed.
#[must_use]
pub fn evaluate_and_reconcile(
    clinician: &Clinician,
    today: Date,
) -> (AccessDecision, Option<Clinician>) {
    let mut reconciled = None;
    let mut login_active = clinician.login_active;

    if let Some(expiry) = clinician.contract_expiry_eod_date {
        if today > expiry && login_active {
            login_active = false;
            let mut updated = clinician.clone();
            updated.login_active = false;
            reconciled = Some(updated);
        }
    }

    let decision = if !login_active {
        AccessDecision::Deny(DenyReason::InactiveLogin)
    } else if !has_send_entry_access(clinician) {
        AccessDecision::Deny(DenyReason::NotAuthorised)
    } else {
        AccessDecision::Allow
    };

    (decision, reconciled)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn clinician_with_groups(groups: &[&str]) -> Clinician {
        let mut clinician = Clinician::new("c-1", true);
        clinician.groups = groups.iter().map(|g| g.to_lowercase()).collect();
        clinician
    }

    #[test]
    fn test_allow_for_send_clinician_group() {
        let clinician = clinician_with_groups(&["SEND Clinician"]);
        let (decision, reconciled) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Allow);
        assert!(reconciled.is_none());
    }

    #[test]
    fn test_allow_for_superclinician_group() {
        let clinician = clinician_with_groups(&["SEND Superclinician", "GDM Clinician"]);
        let (decision, _) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn test_deny_without_send_entry_group() {
        // Administrators are not entry users.
        let clinician = clinician_with_groups(&["SEND Administrator"]);
        let (decision, _) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::NotAuthorised));
    }

    #[test]
    fn test_deny_inactive_login() {
        let mut clinician = clinician_with_groups(&["SEND Clinician"]);
        clinician.login_active = false;
        let (decision, reconciled) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::InactiveLogin));
        assert!(reconciled.is_none());
    }

    #[test]
    fn test_expired_contract_is_reconciled() {
        let mut clinician = clinician_with_groups(&["SEND Clinician"]);
        clinician.contract_expiry_eod_date = Some(date!(2020 - 05 - 31));

        let (decision, reconciled) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::InactiveLogin));
        let updated = reconciled.expect("expected a reconciled clinician");
        assert!(!updated.login_active);
    }

    #[test]
    fn test_contract_valid_through_expiry_day() {
        let mut clinician = clinician_with_groups(&["SEND Clinician"]);
        clinician.contract_expiry_eod_date = Some(date!(2020 - 06 - 01));

        let (decision, reconciled) = evaluate_and_reconcile(&clinician, date!(2020 - 06 - 01));
        assert_eq!(decision, AccessDecision::Allow);
        assert!(reconciled.is_none());
    }
}
