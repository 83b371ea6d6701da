//! Yes/no confirmation extraction

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Yes,
    No,
}

const AFFIRMATIVE_KEYWORDS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "correct",
    "right",
    "that's it",
    "sounds good",
    "confirm",
    "sure",
];

const NEGATIVE_KEYWORDS: &[&str] = &["no", "nope", "incorrect", "wrong", "not quite", "change"];

/// Read a yes/no answer out of an utterance; affirmative keywords are
/// checked first. `None` means the handler should re-prompt.
pub fn extract_confirmation(utterance: &str) -> Option<Confirmation> {
    let lower = utterance.to_lowercase();

    for keyword in AFFIRMATIVE_KEYWORDS {
        if lower.contains(keyword) {
            return Some(Confirmation::Yes);
        }
    }
    for keyword in NEGATIVE_KEYWORDS {
        if lower.contains(keyword) {
            return Some(Confirmation::No);
        }
    }
    None
}
