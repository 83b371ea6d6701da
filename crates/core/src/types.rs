//! Shared domain vocabulary and the per-turn response payload

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::call::CallStep;

/// Appointment types offered by the clinic (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    /// Full intake evaluation for new clients
    ComprehensiveEvaluation,
    /// Routine follow-up / medication review
    FollowUp,
    /// Ketamine treatment consultation
    KetamineConsultation,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::ComprehensiveEvaluation => "comprehensive_evaluation",
            AppointmentType::FollowUp => "follow_up",
            AppointmentType::KetamineConsultation => "ketamine_consultation",
        }
    }

    /// Human-readable name used in prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            AppointmentType::ComprehensiveEvaluation => "comprehensive evaluation",
            AppointmentType::FollowUp => "follow-up",
            AppointmentType::KetamineConsultation => "ketamine consultation",
        }
    }

    /// All types, in the order they are offered to callers
    pub fn all() -> &'static [AppointmentType] {
        &[
            AppointmentType::ComprehensiveEvaluation,
            AppointmentType::FollowUp,
            AppointmentType::KetamineConsultation,
        ]
    }
}

impl std::fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Verified client identity returned by the practice-management system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Practice-management client identifier
    pub id: String,
    /// Client display name
    pub name: String,
}

/// Insurance verification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    /// Canonical insurer name
    pub provider: String,
    /// Copay in dollars
    pub copay: f64,
    /// Remaining deductible in dollars
    pub deductible: f64,
}

/// A bookable time interval for a provider on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Provider identifier
    pub provider_id: String,
    /// Appointment date
    pub date: NaiveDate,
    /// Slot start time
    pub time: NaiveTime,
}

/// Reference to an appointment that already exists in the
/// practice-management system (used by reschedule/cancel flows)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRef {
    /// Practice-management appointment identifier
    pub id: String,
    /// Provider identifier
    pub provider_id: String,
    /// Scheduled date
    pub date: NaiveDate,
    /// Scheduled start time
    pub time: NaiveTime,
}

/// Structured response returned to the calling layer for each turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Text to speak back to the caller
    pub message: String,
    /// Step the call is in after this turn
    pub next_step: CallStep,
    /// Enumerated choices offered to the caller, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// True when the caller must complete identity verification next
    #[serde(default)]
    pub requires_verification: bool,
    /// True when the call should be handed to a human
    #[serde(default)]
    pub requires_transfer: bool,
    /// Identifier of a newly created appointment, when one was booked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    /// Verified insurance details, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<InsuranceInfo>,
}

impl TurnResponse {
    /// Plain message response that keeps the call in `step`
    pub fn message(step: CallStep, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            next_step: step,
            options: None,
            requires_verification: false,
            requires_transfer: false,
            appointment_id: None,
            insurance: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_verification_required(mut self) -> Self {
        self.requires_verification = true;
        self
    }

    pub fn with_transfer_required(mut self) -> Self {
        self.requires_transfer = true;
        self
    }

    pub fn with_appointment_id(mut self, id: impl Into<String>) -> Self {
        self.appointment_id = Some(id.into());
        self
    }

    pub fn with_insurance(mut self, info: InsuranceInfo) -> Self {
        self.insurance = Some(info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_type_names() {
        assert_eq!(
            AppointmentType::ComprehensiveEvaluation.as_str(),
            "comprehensive_evaluation"
        );
        assert_eq!(AppointmentType::FollowUp.display_name(), "follow-up");
        assert_eq!(AppointmentType::all().len(), 3);
    }

    #[test]
    fn test_appointment_type_serde() {
        let json = serde_json::to_string(&AppointmentType::KetamineConsultation).unwrap();
        assert_eq!(json, "\"ketamine_consultation\"");
    }

    #[test]
    fn test_response_builders() {
        let response = TurnResponse::message(CallStep::Verification, "Please verify")
            .with_verification_required()
            .with_options(vec!["option a".into()]);

        assert_eq!(response.next_step, CallStep::Verification);
        assert!(response.requires_verification);
        assert!(!response.requires_transfer);
        assert_eq!(response.options.as_deref().map(|o| o.len()), Some(1));
    }
}
