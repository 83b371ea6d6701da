//! External system integrations
//!
//! Traits and stubs for the practice-management and insurance-eligibility
//! systems. The stubs synthesize deterministic responses so the agent can be
//! exercised end to end before the real systems are wired in. Timeout and
//! retry policy belongs behind these traits, not in the state machine.

use async_trait::async_trait;
use frontdesk_core::{AppointmentRef, AppointmentType, ClientInfo, InsuranceInfo, Slot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Practice management
// ============================================================================

/// Outcome of an identity check. A caller the system does not recognize is
/// an ordinary outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityOutcome {
    Verified(ClientInfo),
    NotFound,
}

/// New-appointment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client_id: String,
    pub appointment_type: AppointmentType,
    pub slot: Slot,
}

/// Practice-management system contract
///
/// Implement this trait to integrate with the clinic's PMS (e.g. an EHR
/// scheduling API).
#[async_trait]
pub trait PracticeManagement: Send + Sync {
    /// Verify a caller's identity against phone number and date of birth
    async fn verify_identity(
        &self,
        phone: &str,
        dob: &str,
    ) -> Result<IdentityOutcome, IntegrationError>;

    /// Book a new appointment
    async fn create_appointment(
        &self,
        request: BookingRequest,
    ) -> Result<AppointmentRef, IntegrationError>;

    /// Upcoming appointments for a client
    async fn find_appointments(
        &self,
        client_id: &str,
    ) -> Result<Vec<AppointmentRef>, IntegrationError>;

    /// Move an existing appointment to a new slot
    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        slot: Slot,
    ) -> Result<AppointmentRef, IntegrationError>;

    /// Cancel an existing appointment
    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), IntegrationError>;
}

/// Stub PMS for development and testing
///
/// Verifies any caller except the all-zero phone number, and always has one
/// upcoming appointment on file so the reschedule and cancel flows can run.
pub struct StubPracticeManagement;

impl StubPracticeManagement {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubPracticeManagement {
    fn default() -> Self {
        Self::new()
    }
}

fn last_four(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.chars().rev().take(4).collect::<String>().chars().rev().collect()
}

#[async_trait]
impl PracticeManagement for StubPracticeManagement {
    async fn verify_identity(
        &self,
        phone: &str,
        dob: &str,
    ) -> Result<IdentityOutcome, IntegrationError> {
        let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.iter().all(|c| *c == '0') {
            tracing::info!(phone = %phone, "Stub PMS: identity not found");
            return Ok(IdentityOutcome::NotFound);
        }

        let client = ClientInfo {
            id: format!("CLT-{}", last_four(phone)),
            name: "Taylor Morgan".to_string(),
        };
        tracing::info!(client_id = %client.id, dob = %dob, "Stub PMS: identity verified");
        Ok(IdentityOutcome::Verified(client))
    }

    async fn create_appointment(
        &self,
        request: BookingRequest,
    ) -> Result<AppointmentRef, IntegrationError> {
        let id = format!(
            "APT-{}",
            uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
        );
        tracing::info!(
            appointment_id = %id,
            client_id = %request.client_id,
            provider_id = %request.slot.provider_id,
            date = %request.slot.date,
            time = %request.slot.time,
            appointment_type = %request.appointment_type,
            "Stub PMS: created appointment"
        );
        Ok(AppointmentRef {
            id,
            provider_id: request.slot.provider_id,
            date: request.slot.date,
            time: request.slot.time,
        })
    }

    async fn find_appointments(
        &self,
        client_id: &str,
    ) -> Result<Vec<AppointmentRef>, IntegrationError> {
        tracing::info!(client_id = %client_id, "Stub PMS: find appointments");
        let date = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
        Ok(vec![AppointmentRef {
            id: format!("APT-ON-FILE-{client_id}"),
            provider_id: "dr-patel".to_string(),
            date,
            time: chrono::NaiveTime::from_hms_opt(10, 0, 0)
                .ok_or_else(|| IntegrationError::Internal("bad stub time".to_string()))?,
        }])
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        slot: Slot,
    ) -> Result<AppointmentRef, IntegrationError> {
        if !appointment_id.starts_with("APT-") {
            return Err(IntegrationError::NotFound(appointment_id.to_string()));
        }
        tracing::info!(
            appointment_id = %appointment_id,
            provider_id = %slot.provider_id,
            date = %slot.date,
            time = %slot.time,
            "Stub PMS: rescheduled appointment"
        );
        Ok(AppointmentRef {
            id: appointment_id.to_string(),
            provider_id: slot.provider_id,
            date: slot.date,
            time: slot.time,
        })
    }

    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), IntegrationError> {
        if !appointment_id.starts_with("APT-") {
            return Err(IntegrationError::NotFound(appointment_id.to_string()));
        }
        tracing::info!(appointment_id = %appointment_id, "Stub PMS: cancelled appointment");
        Ok(())
    }
}

// ============================================================================
// Insurance eligibility
// ============================================================================

/// Outcome of an eligibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityOutcome {
    Eligible(InsuranceInfo),
    NotEligible,
}

/// Insurance eligibility contract
#[async_trait]
pub trait InsuranceEligibility: Send + Sync {
    /// Check a member's coverage with the named insurer
    async fn verify(
        &self,
        insurer: &str,
        member_id: &str,
    ) -> Result<EligibilityOutcome, IntegrationError>;
}

/// Stub eligibility checker; verifies everyone unless built denying
pub struct StubInsuranceEligibility {
    deny: bool,
}

impl StubInsuranceEligibility {
    pub fn new() -> Self {
        Self { deny: false }
    }

    /// A checker that finds nobody eligible, for exercising the self-pay path
    pub fn denying() -> Self {
        Self { deny: true }
    }
}

impl Default for StubInsuranceEligibility {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsuranceEligibility for StubInsuranceEligibility {
    async fn verify(
        &self,
        insurer: &str,
        member_id: &str,
    ) -> Result<EligibilityOutcome, IntegrationError> {
        if self.deny {
            tracing::info!(insurer = %insurer, member_id = %member_id, "Stub eligibility: not eligible");
            return Ok(EligibilityOutcome::NotEligible);
        }
        tracing::info!(insurer = %insurer, member_id = %member_id, "Stub eligibility: eligible");
        Ok(EligibilityOutcome::Eligible(InsuranceInfo {
            provider: insurer.to_string(),
            copay: 25.0,
            deductible: 500.0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[tokio::test]
    async fn test_stub_identity_verified() {
        let pms = StubPracticeManagement::new();
        let outcome = pms
            .verify_identity("904-123-4567", "1985-03-15")
            .await
            .unwrap();
        match outcome {
            IdentityOutcome::Verified(client) => assert_eq!(client.id, "CLT-4567"),
            IdentityOutcome::NotFound => panic!("expected verification"),
        }
    }

    #[tokio::test]
    async fn test_stub_identity_not_found() {
        let pms = StubPracticeManagement::new();
        let outcome = pms
            .verify_identity("000-000-0000", "1985-03-15")
            .await
            .unwrap();
        assert!(matches!(outcome, IdentityOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_stub_booking() {
        let pms = StubPracticeManagement::new();
        let appointment = pms
            .create_appointment(BookingRequest {
                client_id: "CLT-4567".to_string(),
                appointment_type: AppointmentType::FollowUp,
                slot: Slot {
                    provider_id: "dr-patel".to_string(),
                    date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                    time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                },
            })
            .await
            .unwrap();
        assert!(appointment.id.starts_with("APT-"));
        assert_eq!(appointment.provider_id, "dr-patel");
    }

    #[tokio::test]
    async fn test_stub_rejects_unknown_appointment_id() {
        let pms = StubPracticeManagement::new();
        let err = pms.cancel_appointment("BOGUS-123").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stub_has_an_appointment_on_file() {
        let pms = StubPracticeManagement::new();
        let appointments = pms.find_appointments("CLT-4567").await.unwrap();
        assert_eq!(appointments.len(), 1);
    }

    #[tokio::test]
    async fn test_stub_eligibility() {
        let checker = StubInsuranceEligibility::new();
        let outcome = checker.verify("Aetna", "CLT-4567").await.unwrap();
        match outcome {
            EligibilityOutcome::Eligible(info) => {
                assert_eq!(info.provider, "Aetna");
                assert!(info.copay > 0.0);
            }
            EligibilityOutcome::NotEligible => panic!("expected eligibility"),
        }

        let denying = StubInsuranceEligibility::denying();
        let outcome = denying.verify("Aetna", "CLT-4567").await.unwrap();
        assert!(matches!(outcome, EligibilityOutcome::NotEligible));
    }
}
