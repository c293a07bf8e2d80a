//! Static demo/test subject identifiers.
//!
//! Static subjects are a fixed, enumerable set of identities used by demo and
//! test environments. Outside production their activations never truly
//! expire, are never consumed by a successful validation, and receive
//! deterministic codes derived from the identifier's last character. The
//! services check the environment before applying any of those rules; nothing
//! here is environment-aware.

/// Returns `true` for static patient identifiers (`static_patient_uuid_1`
/// through `static_patient_uuid_9`).
#[must_use]
pub fn is_static_patient_id(patient_id: &str) -> bool {
    patient_id
        .strip_prefix("static_patient_uuid_")
        .is_some_and(|rest| matches!(rest.as_bytes(), [b'1'..=b'9']))
}

/// Returns `true` for static device identifiers (`static_device_uuid_D1`
/// through `static_device_uuid_D9`).
#[must_use]
pub fn is_static_device_id(device_id: &str) -> bool {
    device_id
        .strip_prefix("static_device_uuid_D")
        .is_some_and(|rest| matches!(rest.as_bytes(), [b'1'..=b'9']))
}

/// Returns the character a static subject's deterministic codes are built
/// from: the last character of the identifier.
#[must_use]
pub fn static_code_char(subject_id: &str) -> Option<char> {
    subject_id.chars().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_patient_ids() {
        for i in 1..=9 {
            assert!(is_static_patient_id(&format!("static_patient_uuid_{i}")));
        }
        assert!(!is_static_patient_id("static_patient_uuid_0"));
        assert!(!is_static_patient_id("static_patient_uuid_10"));
        assert!(!is_static_patient_id("static_device_uuid_D1"));
        assert!(!is_static_patient_id("abc123"));
    }

    #[test]
    fn test_static_device_ids() {
        for i in 1..=9 {
            assert!(is_static_device_id(&format!("static_device_uuid_D{i}")));
        }
        assert!(!is_static_device_id("static_device_uuid_D0"));
        assert!(!is_static_device_id("static_device_uuid_5"));
        assert!(!is_static_device_id("static_patient_uuid_5"));
    }

    #[test]
    fn test_static_code_char() {
        assert_eq!(static_code_char("static_patient_uuid_3"), Some('3'));
        assert_eq!(static_code_char("static_device_uuid_D5"), Some('5'));
        assert_eq!(static_code_char(""), None);
    }
}
