//! Identity field extraction (phone number, date of birth)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identity fields pulled from a single utterance. Either field may be
/// missing; the verification handler re-prompts for whichever is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IdentityFields {
    /// Ten digits, normalized to `XXX-XXX-XXXX`
    pub phone: Option<String>,
    /// Normalized to `YYYY-MM-DD`; calendar validity is not checked here
    pub dob: Option<String>,
}

impl IdentityFields {
    pub fn is_complete(&self) -> bool {
        self.phone.is_some() && self.dob.is_some()
    }
}

// North American number with optional country code and any of the usual
// separators: "904-123-4567", "(904) 123 4567", "+1 904.123.4567".
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?(\d{3})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})")
        .expect("phone regex is valid")
});

// MM/DD/YYYY or MM-DD-YYYY, single-digit month/day accepted.
static DOB_MDY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").expect("dob regex is valid"));

// ISO-style YYYY-MM-DD or YYYY/MM/DD.
static DOB_YMD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b").expect("dob regex is valid"));

/// Extract phone number and date of birth from an utterance.
///
/// Both fields are normalized textually: phone to `XXX-XXX-XXXX`, date of
/// birth to `YYYY-MM-DD`. No calendar validation happens here; the identity
/// check downstream rejects nonsense dates.
pub fn extract_identity_fields(utterance: &str) -> IdentityFields {
    IdentityFields {
        phone: extract_phone(utterance),
        dob: extract_dob(utterance),
    }
}

fn extract_phone(utterance: &str) -> Option<String> {
    PHONE_RE
        .captures(utterance)
        .map(|caps| format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

fn extract_dob(utterance: &str) -> Option<String> {
    // ISO form first so "1985-03-15" is not misread as month 1985.
    if let Some(caps) = DOB_YMD_RE.captures(utterance) {
        let year: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return Some(format!("{year:04}-{month:02}-{day:02}"));
    }
    if let Some(caps) = DOB_MDY_RE.captures(utterance) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: u32 = caps[3].parse().ok()?;
        return Some(format!("{year:04}-{month:02}-{day:02}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_and_dob_in_one_utterance() {
        let fields =
            extract_identity_fields("My number is 904-123-4567 and I was born 03/15/1985");
        assert_eq!(fields.phone.as_deref(), Some("904-123-4567"));
        assert_eq!(fields.dob.as_deref(), Some("1985-03-15"));
        assert!(fields.is_complete());
    }

    #[test]
    fn test_phone_formats() {
        for input in [
            "904-123-4567",
            "(904) 123-4567",
            "904.123.4567",
            "9041234567",
            "+1 904 123 4567",
            "1-904-123-4567",
        ] {
            let fields = extract_identity_fields(input);
            assert_eq!(fields.phone.as_deref(), Some("904-123-4567"), "{input}");
        }
    }

    #[test]
    fn test_dob_formats() {
        for input in ["03/15/1985", "3/15/1985", "03-15-1985", "1985-03-15", "1985/3/15"] {
            let fields = extract_identity_fields(input);
            assert_eq!(fields.dob.as_deref(), Some("1985-03-15"), "{input}");
        }
    }

    #[test]
    fn test_partial_fields() {
        let fields = extract_identity_fields("it's 904-123-4567");
        assert!(fields.phone.is_some());
        assert!(fields.dob.is_none());
        assert!(!fields.is_complete());

        let fields = extract_identity_fields("born on 03/15/1985");
        assert!(fields.phone.is_none());
        assert!(fields.dob.is_some());
    }

    #[test]
    fn test_no_fields() {
        let fields = extract_identity_fields("hello, I'd like to book something");
        assert_eq!(fields, IdentityFields::default());
    }

    #[test]
    fn test_no_semantic_validation() {
        // Normalization is textual only; "13/45/1985" still comes through.
        let fields = extract_identity_fields("13/45/1985");
        assert_eq!(fields.dob.as_deref(), Some("1985-13-45"));
    }
}
