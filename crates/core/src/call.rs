//! Call steps for the scripted scheduling flow

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of a call in the scripted conversation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallStep {
    /// Opening prompt and intent capture
    #[default]
    Greeting,
    /// Phone + date-of-birth identity verification
    Verification,
    /// Choosing the appointment type
    AppointmentType,
    /// Choosing a provider for the selected type
    ProviderSelection,
    /// Choosing a date from the provider's availability
    DateSelection,
    /// Choosing a time slot on the selected date
    TimeSelection,
    /// Insurance capture and eligibility check
    InsuranceVerification,
    /// Final yes/no before booking
    Confirmation,
    /// Moving an existing appointment
    Rescheduling,
    /// Cancelling an existing appointment
    Cancellation,
    /// Caller asked to change something before booking
    Modification,
    /// Appointment booked, rescheduled, or cancelled
    Completed,
    /// Identity check failed, call needs a human
    VerificationFailed,
}

/// Static transition map; `allowed_transitions` would otherwise rebuild a
/// Vec on every dispatch.
static STEP_TRANSITIONS: Lazy<HashMap<CallStep, &'static [CallStep]>> = Lazy::new(|| {
    use CallStep::*;
    let mut map = HashMap::new();
    map.insert(Greeting, &[Verification] as &[_]);
    map.insert(
        Verification,
        &[AppointmentType, Rescheduling, Cancellation, VerificationFailed] as &[_],
    );
    map.insert(AppointmentType, &[ProviderSelection] as &[_]);
    map.insert(ProviderSelection, &[DateSelection] as &[_]);
    map.insert(DateSelection, &[TimeSelection] as &[_]);
    // Confirmation directly when moving an existing appointment (insurance
    // was settled when it was first booked)
    map.insert(TimeSelection, &[InsuranceVerification, Confirmation] as &[_]);
    map.insert(InsuranceVerification, &[Confirmation] as &[_]);
    map.insert(Confirmation, &[Completed, Modification] as &[_]);
    map.insert(Rescheduling, &[DateSelection, Completed] as &[_]);
    map.insert(Cancellation, &[Completed] as &[_]);
    map.insert(
        Modification,
        &[
            AppointmentType,
            ProviderSelection,
            DateSelection,
            TimeSelection,
            InsuranceVerification,
        ] as &[_],
    );
    map.insert(Completed, &[] as &[_]);
    map.insert(VerificationFailed, &[] as &[_]);
    map
});

impl CallStep {
    /// Get allowed transitions from the current step
    pub fn allowed_transitions(&self) -> &'static [CallStep] {
        STEP_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    /// Check if transition to the target step is allowed (staying put is
    /// always allowed; re-prompts do not advance the step)
    pub fn can_transition_to(&self, target: CallStep) -> bool {
        target == *self || self.allowed_transitions().contains(&target)
    }

    /// Terminal steps accept no further turns
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStep::Completed | CallStep::VerificationFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStep::Greeting => "greeting",
            CallStep::Verification => "verification",
            CallStep::AppointmentType => "appointment_type",
            CallStep::ProviderSelection => "provider_selection",
            CallStep::DateSelection => "date_selection",
            CallStep::TimeSelection => "time_selection",
            CallStep::InsuranceVerification => "insurance_verification",
            CallStep::Confirmation => "confirmation",
            CallStep::Rescheduling => "rescheduling",
            CallStep::Cancellation => "cancellation",
            CallStep::Modification => "modification",
            CallStep::Completed => "completed",
            CallStep::VerificationFailed => "verification_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<CallStep> {
        match s {
            "greeting" => Some(CallStep::Greeting),
            "verification" => Some(CallStep::Verification),
            "appointment_type" => Some(CallStep::AppointmentType),
            "provider_selection" => Some(CallStep::ProviderSelection),
            "date_selection" => Some(CallStep::DateSelection),
            "time_selection" => Some(CallStep::TimeSelection),
            "insurance_verification" => Some(CallStep::InsuranceVerification),
            "confirmation" => Some(CallStep::Confirmation),
            "rescheduling" => Some(CallStep::Rescheduling),
            "cancellation" => Some(CallStep::Cancellation),
            "modification" => Some(CallStep::Modification),
            "completed" => Some(CallStep::Completed),
            "verification_failed" => Some(CallStep::VerificationFailed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
