//! Per-call conversation record and its transition events
//!
//! Handlers never mutate a record directly; they compute [`CallEvent`]s
//! against a snapshot and the driver applies them through
//! [`CallRecord::apply`]. That keeps every state change in one place, makes
//! downstream-field invalidation uniform, and guarantees nothing is half
//! applied when a handler fails partway.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use frontdesk_core::{
    AppointmentRef, AppointmentType, CallStep, ClientInfo, InsuranceInfo, Slot, Turn,
};
use frontdesk_extract::{CallIntent, IdentityFields};

/// Full conversational state for one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Opaque caller-supplied identifier, immutable for the call's lifetime
    pub call_id: String,
    pub step: CallStep,

    /// What the caller asked for in the greeting; drives where verification
    /// sends them
    pub intent: Option<CallIntent>,

    pub client_verified: bool,
    pub client: Option<ClientInfo>,
    /// Identity fields captured so far; either may arrive first
    pub phone: Option<String>,
    pub dob: Option<String>,

    pub insurance_verified: bool,
    pub insurance: Option<InsuranceInfo>,
    /// A self-pay offer is on the table awaiting a yes/no
    pub self_pay_offered: bool,
    /// Caller elected to pay out of pocket
    pub self_pay: bool,

    pub appointment_type: Option<AppointmentType>,
    /// Provider id, always one of the candidates for `appointment_type`
    pub preferred_provider: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<NaiveTime>,

    /// Slots last offered to the caller; recomputed whenever an upstream
    /// selection changes
    pub available_slots: Vec<Slot>,
    pub selected_slot: Option<Slot>,

    /// The appointment being moved or cancelled, once found in the PMS
    pub existing_appointment: Option<AppointmentRef>,

    /// Append-only transcript, user and agent turns interleaved
    pub history: Vec<Turn>,

    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl CallRecord {
    pub fn new(call_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            step: CallStep::Greeting,
            intent: None,
            client_verified: false,
            client: None,
            phone: None,
            dob: None,
            insurance_verified: false,
            insurance: None,
            self_pay_offered: false,
            self_pay: false,
            appointment_type: None,
            preferred_provider: None,
            preferred_date: None,
            preferred_time: None,
            available_slots: Vec::new(),
            selected_slot: None,
            existing_appointment: None,
            history: Vec::new(),
            started_at: now,
            last_activity: now,
        }
    }

    /// Apply one transition event. Invalid step transitions are rejected
    /// (logged and skipped) rather than corrupting the record.
    pub fn apply(&mut self, event: CallEvent) {
        match event {
            CallEvent::UserSaid(content) => self.history.push(Turn::user(content)),
            CallEvent::AgentSaid(content) => self.history.push(Turn::agent(content)),

            CallEvent::IntentCaptured(intent) => self.intent = Some(intent),

            CallEvent::IdentityFieldsCaptured(fields) => {
                if fields.phone.is_some() {
                    self.phone = fields.phone;
                }
                if fields.dob.is_some() {
                    self.dob = fields.dob;
                }
            }
            CallEvent::IdentityVerified(client) => {
                self.client_verified = true;
                self.client = Some(client);
            }

            CallEvent::AppointmentTypeSelected(appointment_type) => {
                self.appointment_type = Some(appointment_type);
                self.clear_provider_onward();
            }
            CallEvent::ProviderSelected(provider_id) => {
                self.preferred_provider = Some(provider_id);
                self.clear_date_onward();
            }
            CallEvent::DateSelected(date) => {
                self.preferred_date = Some(date);
                self.clear_time_onward();
            }
            CallEvent::SlotsComputed(slots) => self.available_slots = slots,
            CallEvent::SlotSelected(slot) => {
                self.preferred_time = Some(slot.time);
                self.selected_slot = Some(slot);
            }

            CallEvent::InsuranceVerified(info) => {
                self.insurance_verified = true;
                self.insurance = Some(info);
                self.self_pay_offered = false;
            }
            CallEvent::SelfPayOffered => self.self_pay_offered = true,
            CallEvent::SelfPayAccepted => {
                self.self_pay = true;
                self.self_pay_offered = false;
            }

            CallEvent::ExistingAppointmentFound(appointment) => {
                self.existing_appointment = Some(appointment);
            }

            CallEvent::Advanced(step) => {
                if self.step.can_transition_to(step) {
                    self.step = step;
                } else {
                    tracing::warn!(
                        call_id = %self.call_id,
                        from = %self.step,
                        to = %step,
                        "rejected invalid step transition"
                    );
                }
            }
            CallEvent::ReturnedTo(step) => {
                if self.step.can_transition_to(step) {
                    self.clear_for(step);
                    self.step = step;
                } else {
                    tracing::warn!(
                        call_id = %self.call_id,
                        from = %self.step,
                        to = %step,
                        "rejected invalid return transition"
                    );
                }
            }
        }
        self.last_activity = Utc::now();
    }

    /// Whether this record has gone untouched past the staleness threshold
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        now - self.last_activity > stale_after
    }

    // Re-entering a selection step invalidates that field and everything
    // chosen after it.
    fn clear_for(&mut self, step: CallStep) {
        match step {
            CallStep::AppointmentType => {
                self.appointment_type = None;
                self.clear_provider_onward();
            }
            CallStep::ProviderSelection => self.clear_provider_onward(),
            CallStep::DateSelection => self.clear_date_onward(),
            CallStep::TimeSelection => self.clear_time_onward(),
            CallStep::InsuranceVerification => self.clear_insurance(),
            _ => {}
        }
    }

    fn clear_provider_onward(&mut self) {
        self.preferred_provider = None;
        self.clear_date_onward();
    }

    fn clear_date_onward(&mut self) {
        self.preferred_date = None;
        self.clear_time_onward();
    }

    fn clear_time_onward(&mut self) {
        self.preferred_time = None;
        self.available_slots.clear();
        self.selected_slot = None;
        self.clear_insurance();
    }

    fn clear_insurance(&mut self) {
        self.insurance_verified = false;
        self.insurance = None;
        self.self_pay_offered = false;
        self.self_pay = false;
    }
}

/// One state change computed by a step handler
#[derive(Debug, Clone)]
pub enum CallEvent {
    UserSaid(String),
    AgentSaid(String),
    IntentCaptured(CallIntent),
    IdentityFieldsCaptured(IdentityFields),
    IdentityVerified(ClientInfo),
    AppointmentTypeSelected(AppointmentType),
    ProviderSelected(String),
    DateSelected(NaiveDate),
    SlotsComputed(Vec<Slot>),
    SlotSelected(Slot),
    InsuranceVerified(InsuranceInfo),
    SelfPayOffered,
    SelfPayAccepted,
    ExistingAppointmentFound(AppointmentRef),
    /// Move to the next step; rejected if the transition table forbids it
    Advanced(CallStep),
    /// Go back to an earlier selection step, clearing it and everything
    /// downstream of it
    ReturnedTo(CallStep),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CallRecord {
        CallRecord::new("call-1")
    }

    #[test]
    fn test_new_record_starts_at_greeting() {
        let record = record();
        assert_eq!(record.step, CallStep::Greeting);
        assert!(record.history.is_empty());
        assert!(!record.client_verified);
    }

    #[test]
    fn test_history_interleaving() {
        let mut record = record();
        record.apply(CallEvent::UserSaid("hello".to_string()));
        record.apply(CallEvent::AgentSaid("hi there".to_string()));
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].content, "hello");
        assert_eq!(record.history[1].content, "hi there");
    }

    #[test]
    fn test_identity_fields_merge_across_turns() {
        let mut record = record();
        record.apply(CallEvent::IdentityFieldsCaptured(IdentityFields {
            phone: Some("904-123-4567".to_string()),
            dob: None,
        }));
        record.apply(CallEvent::IdentityFieldsCaptured(IdentityFields {
            phone: None,
            dob: Some("1985-03-15".to_string()),
        }));
        assert_eq!(record.phone.as_deref(), Some("904-123-4567"));
        assert_eq!(record.dob.as_deref(), Some("1985-03-15"));
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut record = record();
        record.apply(CallEvent::Advanced(CallStep::Confirmation));
        assert_eq!(record.step, CallStep::Greeting);

        record.apply(CallEvent::Advanced(CallStep::Verification));
        assert_eq!(record.step, CallStep::Verification);
    }

    #[test]
    fn test_upstream_change_clears_downstream() {
        let mut record = record();
        record.apply(CallEvent::AppointmentTypeSelected(
            AppointmentType::FollowUp,
        ));
        record.apply(CallEvent::ProviderSelected("dr-patel".to_string()));
        record.apply(CallEvent::DateSelected(
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        ));
        let slot = Slot {
            provider_id: "dr-patel".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        record.apply(CallEvent::SlotSelected(slot));
        assert!(record.selected_slot.is_some());

        // Picking a different provider invalidates date, time and slot.
        record.apply(CallEvent::ProviderSelected("dr-reyes".to_string()));
        assert!(record.preferred_date.is_none());
        assert!(record.preferred_time.is_none());
        assert!(record.selected_slot.is_none());
        // The appointment type survives; it is upstream of the provider.
        assert_eq!(record.appointment_type, Some(AppointmentType::FollowUp));
    }

    #[test]
    fn test_returned_to_clears_target_field() {
        let mut record = record();
        record.step = CallStep::Modification;
        record.appointment_type = Some(AppointmentType::FollowUp);
        record.preferred_provider = Some("dr-patel".to_string());
        record.preferred_date = NaiveDate::from_ymd_opt(2026, 9, 1);

        record.apply(CallEvent::ReturnedTo(CallStep::DateSelection));
        assert_eq!(record.step, CallStep::DateSelection);
        assert!(record.preferred_date.is_none());
        // Upstream selections are kept.
        assert_eq!(record.preferred_provider.as_deref(), Some("dr-patel"));
    }

    #[test]
    fn test_apply_touches_last_activity() {
        let mut record = record();
        let before = record.last_activity;
        std::thread::sleep(std::time::Duration::from_millis(5));
        record.apply(CallEvent::UserSaid("hello".to_string()));
        assert!(record.last_activity > before);
    }

    #[test]
    fn test_staleness() {
        let mut record = record();
        record.last_activity = Utc::now() - chrono::Duration::seconds(1000);
        assert!(record.is_stale(Utc::now(), chrono::Duration::seconds(900)));
        assert!(!record.is_stale(Utc::now(), chrono::Duration::seconds(2000)));
    }
}
