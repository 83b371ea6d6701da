//! Accepted-insurer list and utterance matching

use serde::{Deserialize, Serialize};

/// Outcome of matching an utterance against the insurer tables.
///
/// `NotAccepted` means we recognized the insurer and know the clinic is out
/// of network; `NoMatch` means we could not tell which insurer was named.
/// Both lead to the same self-pay offer, but they log differently and the
/// distinction matters for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsurerMatch {
    Accepted(String),
    NotAccepted(String),
    NoMatch,
}

// (canonical name, match keywords) — keywords are lowercase substrings.
const ACCEPTED: &[(&str, &[&str])] = &[
    ("Aetna", &["aetna"]),
    ("Blue Cross Blue Shield", &["blue cross", "bcbs"]),
    ("Cigna", &["cigna"]),
    ("UnitedHealthcare", &["unitedhealthcare", "united health", "uhc"]),
    ("Medicare", &["medicare"]),
];

// Insurers callers name often enough to recognize, but out of network.
const KNOWN_UNACCEPTED: &[(&str, &[&str])] = &[
    ("Humana", &["humana"]),
    ("Kaiser Permanente", &["kaiser"]),
    ("Molina Healthcare", &["molina"]),
    ("Oscar Health", &["oscar"]),
];

/// Canonical names of every accepted insurer, for prompting
pub fn accepted_insurers() -> Vec<&'static str> {
    ACCEPTED.iter().map(|(name, _)| *name).collect()
}

/// Whether a named insurer is in network
pub fn is_accepted_insurer(name: &str) -> bool {
    matches!(match_insurer(name), InsurerMatch::Accepted(_))
}

/// Match an utterance against accepted insurers first, then the
/// known-unaccepted table.
pub fn match_insurer(utterance: &str) -> InsurerMatch {
    let lower = utterance.to_lowercase();

    for (name, keywords) in ACCEPTED {
        if keywords.iter().any(|k| lower.contains(k)) {
            return InsurerMatch::Accepted(name.to_string());
        }
    }
    for (name, keywords) in KNOWN_UNACCEPTED {
        if keywords.iter().any(|k| lower.contains(k)) {
            return InsurerMatch::NotAccepted(name.to_string());
        }
    }
    InsurerMatch::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted() {
        assert_eq!(
            match_insurer("I have Aetna"),
            InsurerMatch::Accepted("Aetna".to_string())
        );
        assert_eq!(
            match_insurer("blue cross blue shield of florida"),
            InsurerMatch::Accepted("Blue Cross Blue Shield".to_string())
        );
        assert_eq!(
            match_insurer("it's UHC through work"),
            InsurerMatch::Accepted("UnitedHealthcare".to_string())
        );
    }

    #[test]
    fn test_known_unaccepted() {
        assert_eq!(
            match_insurer("I'm on Humana"),
            InsurerMatch::NotAccepted("Humana".to_string())
        );
        assert_eq!(
            match_insurer("kaiser permanente"),
            InsurerMatch::NotAccepted("Kaiser Permanente".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_insurer("some regional plan"), InsurerMatch::NoMatch);
        assert_eq!(match_insurer(""), InsurerMatch::NoMatch);
    }

    #[test]
    fn test_is_accepted_insurer() {
        assert!(is_accepted_insurer("Cigna"));
        assert!(!is_accepted_insurer("Humana"));
        assert!(!is_accepted_insurer("some regional plan"));
    }

    #[test]
    fn test_accepted_list_for_prompting() {
        let names = accepted_insurers();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"Medicare"));
    }
}
