//! Per-step conversation handlers
//!
//! Each handler takes a snapshot of the call record plus the caller's
//! utterance and returns a [`StepOutcome`]: the reply to speak and the
//! events to apply. Handlers never mutate the record themselves, so a
//! collaborator failure mid-handler leaves the conversation exactly where
//! it was.
//!
//! Extraction misses, failed identity checks, out-of-network insurers and
//! availability conflicts are all ordinary outcomes handled by re-prompting
//! or offering alternatives; only collaborator failures return `Err`.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

use frontdesk_core::{AppointmentType, CallStep, Slot, TurnResponse};
use frontdesk_directory::{accepted_insurers, match_insurer, Directory, InsurerMatch};
use frontdesk_extract::{
    classify_intent, extract_appointment_type, extract_confirmation, extract_date, extract_time,
    extract_identity_fields, CallIntent, Confirmation,
};
use frontdesk_tools::{
    AuditEvent, AuditKind, AuditSink, AvailabilityCache, BookingRequest, EligibilityOutcome,
    IdentityOutcome, InsuranceEligibility, PracticeManagement,
};

use crate::record::{CallEvent, CallRecord};
use crate::AgentError;

/// What a handler decided: the reply plus the state changes to apply
pub struct StepOutcome {
    pub response: TurnResponse,
    pub events: Vec<CallEvent>,
}

impl StepOutcome {
    fn reply(response: TurnResponse) -> Self {
        Self {
            response,
            events: Vec::new(),
        }
    }

    fn with_events(response: TurnResponse, events: Vec<CallEvent>) -> Self {
        Self { response, events }
    }
}

/// How many dates/times to read out per prompt; voice callers lose track
/// past a handful.
const MAX_SPOKEN_OPTIONS: usize = 5;

pub struct StepHandlers {
    directory: Arc<Directory>,
    pms: Arc<dyn PracticeManagement>,
    eligibility: Arc<dyn InsuranceEligibility>,
    availability: Arc<AvailabilityCache>,
    audit: Arc<dyn AuditSink>,
}

impl StepHandlers {
    pub fn new(
        directory: Arc<Directory>,
        pms: Arc<dyn PracticeManagement>,
        eligibility: Arc<dyn InsuranceEligibility>,
        availability: Arc<AvailabilityCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            directory,
            pms,
            eligibility,
            availability,
            audit,
        }
    }

    /// Dispatch on the record's current step
    pub async fn handle(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        match record.step {
            CallStep::Greeting => Ok(self.greeting(record, utterance)),
            CallStep::Verification => self.verification(record, utterance).await,
            CallStep::AppointmentType => Ok(self.appointment_type(record, utterance)),
            CallStep::ProviderSelection => self.provider_selection(record, utterance),
            CallStep::DateSelection => self.date_selection(record, utterance),
            CallStep::TimeSelection => self.time_selection(record, utterance),
            CallStep::InsuranceVerification => self.insurance_verification(record, utterance).await,
            CallStep::Confirmation => self.confirmation(record, utterance).await,
            CallStep::Rescheduling => self.rescheduling(record, utterance),
            CallStep::Cancellation => self.cancellation(record, utterance).await,
            CallStep::Modification => self.modification(record, utterance),
            CallStep::Completed | CallStep::VerificationFailed => {
                Ok(StepOutcome::reply(TurnResponse::message(
                    record.step,
                    "This call has wrapped up. If there's anything else, please call us back.",
                )))
            }
        }
    }

    fn greeting(&self, record: &CallRecord, utterance: &str) -> StepOutcome {
        let intent = classify_intent(utterance);
        if intent == CallIntent::General {
            return StepOutcome::reply(
                TurnResponse::message(
                    record.step,
                    "I can help you schedule a new appointment, or change or cancel an \
                     existing one. What would you like to do?",
                )
                .with_options(vec![
                    "schedule an appointment".to_string(),
                    "move my appointment".to_string(),
                    "cancel my appointment".to_string(),
                ]),
            );
        }

        tracing::debug!(call_id = %record.call_id, intent = %intent, "intent captured");
        StepOutcome::with_events(
            TurnResponse::message(
                CallStep::Verification,
                "I can help with that. First I need to verify your identity. \
                 Could I have your phone number and date of birth?",
            )
            .with_verification_required(),
            vec![
                CallEvent::IntentCaptured(intent),
                CallEvent::Advanced(CallStep::Verification),
            ],
        )
    }

    async fn verification(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let extracted = extract_identity_fields(utterance);
        let mut events = Vec::new();
        if extracted.phone.is_some() || extracted.dob.is_some() {
            events.push(CallEvent::IdentityFieldsCaptured(extracted.clone()));
        }

        let phone = extracted.phone.or_else(|| record.phone.clone());
        let dob = extracted.dob.or_else(|| record.dob.clone());

        let (phone, dob) = match (phone, dob) {
            (Some(phone), Some(dob)) => (phone, dob),
            (None, None) => {
                return Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        record.step,
                        "I didn't catch that. Could I have your phone number and date \
                         of birth?",
                    )
                    .with_verification_required(),
                    events,
                ));
            }
            (phone, _) => {
                let missing = if phone.is_none() {
                    "phone number"
                } else {
                    "date of birth"
                };
                return Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        record.step,
                        format!("Thanks, I still need your {missing} to verify you."),
                    )
                    .with_verification_required(),
                    events,
                ));
            }
        };

        match self.pms.verify_identity(&phone, &dob).await? {
            IdentityOutcome::NotFound => {
                self.audit.record(AuditEvent::new(
                    &record.call_id,
                    AuditKind::IdentityRejected,
                    "identity check failed",
                ));
                events.push(CallEvent::Advanced(CallStep::VerificationFailed));
                Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        CallStep::VerificationFailed,
                        "I wasn't able to verify your identity with that information. \
                         Let me transfer you to our front desk staff who can help.",
                    )
                    .with_transfer_required(),
                    events,
                ))
            }
            IdentityOutcome::Verified(client) => {
                self.audit.record(AuditEvent::new(
                    &record.call_id,
                    AuditKind::IdentityVerified,
                    format!("client {}", client.id),
                ));
                let first_name = client.name.split_whitespace().next().unwrap_or("there");
                let greeting = format!("Thanks {first_name}, you're verified.");
                events.push(CallEvent::IdentityVerified(client.clone()));

                match record.intent.unwrap_or(CallIntent::Schedule) {
                    CallIntent::Schedule | CallIntent::General => {
                        events.push(CallEvent::Advanced(CallStep::AppointmentType));
                        Ok(StepOutcome::with_events(
                            self.appointment_type_prompt(&format!(
                                "{greeting} What type of appointment would you like?"
                            )),
                            events,
                        ))
                    }
                    intent @ (CallIntent::Reschedule | CallIntent::Cancel) => {
                        let appointments = self.pms.find_appointments(&client.id).await?;
                        let Some(appointment) = appointments.into_iter().next() else {
                            events.push(CallEvent::IntentCaptured(CallIntent::Schedule));
                            events.push(CallEvent::Advanced(CallStep::AppointmentType));
                            return Ok(StepOutcome::with_events(
                                self.appointment_type_prompt(&format!(
                                    "{greeting} I don't see any upcoming appointments on \
                                     file, but I'd be happy to schedule one. What type of \
                                     appointment would you like?"
                                )),
                                events,
                            ));
                        };

                        let provider_name = self.provider_name(&appointment.provider_id);
                        let when = format!(
                            "{} at {}",
                            format_date(appointment.date),
                            format_time(appointment.time)
                        );
                        events.push(CallEvent::ExistingAppointmentFound(appointment));

                        let (step, question) = if intent == CallIntent::Reschedule {
                            (
                                CallStep::Rescheduling,
                                "Is that the one you'd like to move?",
                            )
                        } else {
                            (CallStep::Cancellation, "Would you like me to cancel it?")
                        };
                        events.push(CallEvent::Advanced(step));
                        Ok(StepOutcome::with_events(
                            TurnResponse::message(
                                step,
                                format!(
                                    "{greeting} I found your appointment with \
                                     {provider_name} on {when}. {question}"
                                ),
                            ),
                            events,
                        ))
                    }
                }
            }
        }
    }

    fn appointment_type(&self, _record: &CallRecord, utterance: &str) -> StepOutcome {
        let Some(appointment_type) = extract_appointment_type(utterance) else {
            return StepOutcome::reply(self.appointment_type_prompt(
                "I didn't catch that. Which type of appointment would you like?",
            ));
        };

        let providers = self.directory.providers_for(appointment_type);
        let names: Vec<String> = providers.iter().map(|p| p.name.clone()).collect();
        StepOutcome::with_events(
            TurnResponse::message(
                CallStep::ProviderSelection,
                format!(
                    "A {appointment_type} — for that you can see {}. Who would you prefer?",
                    join_names(&names)
                ),
            )
            .with_options(names),
            vec![
                CallEvent::AppointmentTypeSelected(appointment_type),
                CallEvent::Advanced(CallStep::ProviderSelection),
            ],
        )
    }

    fn provider_selection(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let appointment_type = record.appointment_type.ok_or_else(|| {
            AgentError::Internal("provider selection without an appointment type".to_string())
        })?;

        let Some(provider) = self.directory.find_provider(utterance, appointment_type) else {
            let names: Vec<String> = self
                .directory
                .providers_for(appointment_type)
                .iter()
                .map(|p| p.name.clone())
                .collect();
            return Ok(StepOutcome::reply(
                TurnResponse::message(
                    record.step,
                    format!(
                        "I'm sorry, I didn't catch the provider. You can see {}. \
                         Who would you prefer?",
                        join_names(&names)
                    ),
                )
                .with_options(names),
            ));
        };

        let (message, options) = self.date_prompt(
            &provider.id,
            &format!("{} it is.", provider.name),
            "What day works for you?",
        );
        Ok(StepOutcome::with_events(
            TurnResponse::message(CallStep::DateSelection, message).with_options(options),
            vec![
                CallEvent::ProviderSelected(provider.id),
                CallEvent::Advanced(CallStep::DateSelection),
            ],
        ))
    }

    fn date_selection(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let provider_id = record.preferred_provider.clone().ok_or_else(|| {
            AgentError::Internal("date selection without a provider".to_string())
        })?;

        let dates = self.directory.available_dates(&provider_id, today());
        let reprompt = |lead: &str| {
            let (message, options) = self.date_prompt(&provider_id, lead, "What day works?");
            StepOutcome::reply(
                TurnResponse::message(record.step, message).with_options(options),
            )
        };

        let Some(date) = extract_date(utterance) else {
            return Ok(reprompt("I didn't catch a date."));
        };
        if !dates.contains(&date) {
            return Ok(reprompt(&format!(
                "{} isn't available with that provider.",
                format_date(date)
            )));
        }

        let times = self.availability.times_for(&provider_id, date);
        let slots: Vec<Slot> = times
            .iter()
            .map(|&time| Slot {
                provider_id: provider_id.clone(),
                date,
                time,
            })
            .collect();
        let spoken: Vec<String> = times
            .iter()
            .take(MAX_SPOKEN_OPTIONS)
            .map(|&t| format_time(t))
            .collect();

        Ok(StepOutcome::with_events(
            TurnResponse::message(
                CallStep::TimeSelection,
                format!(
                    "On {} they have {}, and more. What time would you like?",
                    format_date(date),
                    spoken.join(", ")
                ),
            )
            .with_options(spoken),
            vec![
                CallEvent::DateSelected(date),
                CallEvent::SlotsComputed(slots),
                CallEvent::Advanced(CallStep::TimeSelection),
            ],
        ))
    }

    fn time_selection(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let provider_id = record.preferred_provider.clone().ok_or_else(|| {
            AgentError::Internal("time selection without a provider".to_string())
        })?;
        let date = record
            .preferred_date
            .ok_or_else(|| AgentError::Internal("time selection without a date".to_string()))?;

        // Availability is re-checked on every attempt; the slots shown at
        // date selection may have been taken since.
        let live_times = self.availability.times_for(&provider_id, date);
        let refreshed_slots: Vec<Slot> = live_times
            .iter()
            .map(|&time| Slot {
                provider_id: provider_id.clone(),
                date,
                time,
            })
            .collect();
        let spoken: Vec<String> = live_times
            .iter()
            .take(MAX_SPOKEN_OPTIONS)
            .map(|&t| format_time(t))
            .collect();

        let reprompt = |lead: String, events: Vec<CallEvent>| {
            StepOutcome::with_events(
                TurnResponse::message(
                    record.step,
                    format!("{lead} Times currently open include {}.", spoken.join(", ")),
                )
                .with_options(spoken.clone()),
                events,
            )
        };

        let Some(time) = extract_time(utterance) else {
            return Ok(reprompt("I didn't catch a time.".to_string(), Vec::new()));
        };
        if !live_times.contains(&time) {
            return Ok(reprompt(
                format!("{} isn't available anymore.", format_time(time)),
                vec![CallEvent::SlotsComputed(refreshed_slots)],
            ));
        }

        let slot = Slot {
            provider_id: provider_id.clone(),
            date,
            time,
        };
        self.audit.record(AuditEvent::new(
            &record.call_id,
            AuditKind::SlotSelected,
            format!("{provider_id} {date} {time}"),
        ));

        let mut events = vec![CallEvent::SlotSelected(slot)];
        if let Some(existing) = &record.existing_appointment {
            // Moving an existing appointment; insurance was settled when it
            // was first booked.
            events.push(CallEvent::Advanced(CallStep::Confirmation));
            return Ok(StepOutcome::with_events(
                TurnResponse::message(
                    CallStep::Confirmation,
                    format!(
                        "To confirm: moving your appointment with {} to {} at {}. \
                         Shall I go ahead?",
                        self.provider_name(&existing.provider_id),
                        format_date(date),
                        format_time(time)
                    ),
                ),
                events,
            ));
        }

        events.push(CallEvent::Advanced(CallStep::InsuranceVerification));
        let insurers: Vec<String> = accepted_insurers().iter().map(|s| s.to_string()).collect();
        Ok(StepOutcome::with_events(
            TurnResponse::message(
                CallStep::InsuranceVerification,
                format!(
                    "Great, {} at {}. Which insurance do you have? We accept {}.",
                    format_date(date),
                    format_time(time),
                    insurers.join(", ")
                ),
            )
            .with_options(insurers),
            events,
        ))
    }

    async fn insurance_verification(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        match match_insurer(utterance) {
            InsurerMatch::Accepted(insurer) => {
                let client_id = record
                    .client
                    .as_ref()
                    .map(|c| c.id.clone())
                    .ok_or_else(|| {
                        AgentError::Internal("insurance check without a verified client".to_string())
                    })?;

                match self.eligibility.verify(&insurer, &client_id).await? {
                    EligibilityOutcome::Eligible(info) => {
                        self.audit.record(AuditEvent::new(
                            &record.call_id,
                            AuditKind::InsuranceAccepted,
                            insurer.clone(),
                        ));
                        let summary = self.booking_summary(record);
                        Ok(StepOutcome::with_events(
                            TurnResponse::message(
                                CallStep::Confirmation,
                                format!(
                                    "Your {} coverage is verified — your copay is ${:.0}. \
                                     {summary} Shall I book it?",
                                    info.provider, info.copay
                                ),
                            )
                            .with_insurance(info.clone()),
                            vec![
                                CallEvent::InsuranceVerified(info),
                                CallEvent::Advanced(CallStep::Confirmation),
                            ],
                        ))
                    }
                    EligibilityOutcome::NotEligible => Ok(StepOutcome::with_events(
                        TurnResponse::message(
                            record.step,
                            format!(
                                "I wasn't able to verify coverage with {insurer}. You're \
                                 welcome to proceed as self-pay instead — would you like \
                                 to do that, or try a different insurance?"
                            ),
                        ),
                        vec![CallEvent::SelfPayOffered],
                    )),
                }
            }
            InsurerMatch::NotAccepted(insurer) => Ok(StepOutcome::with_events(
                TurnResponse::message(
                    record.step,
                    format!(
                        "Unfortunately we're not in network with {insurer}. You're welcome \
                         to proceed as self-pay — would you like to do that, or use a \
                         different insurance?"
                    ),
                ),
                vec![CallEvent::SelfPayOffered],
            )),
            InsurerMatch::NoMatch => {
                if record.self_pay_offered {
                    return Ok(match extract_confirmation(utterance) {
                        Some(Confirmation::Yes) => {
                            self.audit.record(AuditEvent::new(
                                &record.call_id,
                                AuditKind::SelfPayElected,
                                "",
                            ));
                            let summary = self.booking_summary(record);
                            StepOutcome::with_events(
                                TurnResponse::message(
                                    CallStep::Confirmation,
                                    format!("No problem, we'll mark the visit as self-pay. \
                                             {summary} Shall I book it?"),
                                ),
                                vec![
                                    CallEvent::SelfPayAccepted,
                                    CallEvent::Advanced(CallStep::Confirmation),
                                ],
                            )
                        }
                        Some(Confirmation::No) => StepOutcome::with_events(
                            self.insurer_prompt(record.step, "Of course."),
                            // Withdraw the offer so a later "yes" is not
                            // misread as electing self-pay.
                            vec![CallEvent::ReturnedTo(CallStep::InsuranceVerification)],
                        ),
                        None => StepOutcome::reply(TurnResponse::message(
                            record.step,
                            "Would you like to proceed as self-pay? Yes or no.",
                        )),
                    });
                }
                Ok(StepOutcome::reply(self.insurer_prompt(
                    record.step,
                    "I didn't recognize that insurance.",
                )))
            }
        }
    }

    async fn confirmation(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        match extract_confirmation(utterance) {
            None => Ok(StepOutcome::reply(TurnResponse::message(
                record.step,
                "Just to confirm — should I go ahead? Yes or no.",
            ))),
            Some(Confirmation::No) => {
                let options = vec![
                    "appointment type".to_string(),
                    "provider".to_string(),
                    "date".to_string(),
                    "time".to_string(),
                    "insurance".to_string(),
                ];
                Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        CallStep::Modification,
                        "No problem. What would you like to change — the appointment \
                         type, provider, date, time, or insurance?",
                    )
                    .with_options(options),
                    vec![CallEvent::Advanced(CallStep::Modification)],
                ))
            }
            Some(Confirmation::Yes) => {
                let slot = record.selected_slot.clone().ok_or_else(|| {
                    AgentError::Internal("confirmation without a selected slot".to_string())
                })?;

                if let Some(existing) = &record.existing_appointment {
                    let updated = self
                        .pms
                        .reschedule_appointment(&existing.id, slot.clone())
                        .await?;
                    self.audit.record(AuditEvent::new(
                        &record.call_id,
                        AuditKind::AppointmentRescheduled,
                        updated.id.clone(),
                    ));
                    self.availability
                        .invalidate(&existing.provider_id, existing.date);
                    self.availability.invalidate(&slot.provider_id, slot.date);
                    return Ok(StepOutcome::with_events(
                        TurnResponse::message(
                            CallStep::Completed,
                            format!(
                                "All done — your appointment with {} is now {} at {}. \
                                 We'll see you then!",
                                self.provider_name(&slot.provider_id),
                                format_date(slot.date),
                                format_time(slot.time)
                            ),
                        )
                        .with_appointment_id(updated.id),
                        vec![CallEvent::Advanced(CallStep::Completed)],
                    ));
                }

                let client_id = record
                    .client
                    .as_ref()
                    .map(|c| c.id.clone())
                    .ok_or_else(|| {
                        AgentError::Internal("booking without a verified client".to_string())
                    })?;
                let appointment_type = record.appointment_type.ok_or_else(|| {
                    AgentError::Internal("booking without an appointment type".to_string())
                })?;

                let appointment = self
                    .pms
                    .create_appointment(BookingRequest {
                        client_id,
                        appointment_type,
                        slot: slot.clone(),
                    })
                    .await?;
                self.audit.record(AuditEvent::new(
                    &record.call_id,
                    AuditKind::AppointmentBooked,
                    appointment.id.clone(),
                ));
                self.availability.invalidate(&slot.provider_id, slot.date);

                Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        CallStep::Completed,
                        format!(
                            "You're all set! Your {} with {} is booked for {} at {}. \
                             Your confirmation number is {}.",
                            appointment_type,
                            self.provider_name(&slot.provider_id),
                            format_date(slot.date),
                            format_time(slot.time),
                            appointment.id
                        ),
                    )
                    .with_appointment_id(appointment.id),
                    vec![CallEvent::Advanced(CallStep::Completed)],
                ))
            }
        }
    }

    fn rescheduling(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let existing = record.existing_appointment.clone().ok_or_else(|| {
            AgentError::Internal("rescheduling without an existing appointment".to_string())
        })?;

        match extract_confirmation(utterance) {
            Some(Confirmation::Yes) => {
                let (message, options) = self.date_prompt(
                    &existing.provider_id,
                    "Okay, let's find a new day.",
                    "What day works for you?",
                );
                Ok(StepOutcome::with_events(
                    TurnResponse::message(CallStep::DateSelection, message).with_options(options),
                    vec![
                        CallEvent::ProviderSelected(existing.provider_id),
                        CallEvent::Advanced(CallStep::DateSelection),
                    ],
                ))
            }
            Some(Confirmation::No) => Ok(StepOutcome::with_events(
                TurnResponse::message(
                    CallStep::Completed,
                    "That's the only upcoming appointment I see on file, so I'll leave \
                     everything as it is. Feel free to call back anytime.",
                ),
                vec![CallEvent::Advanced(CallStep::Completed)],
            )),
            None => Ok(StepOutcome::reply(TurnResponse::message(
                record.step,
                "Is that the appointment you'd like to move? Yes or no.",
            ))),
        }
    }

    async fn cancellation(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let existing = record.existing_appointment.clone().ok_or_else(|| {
            AgentError::Internal("cancellation without an existing appointment".to_string())
        })?;

        match extract_confirmation(utterance) {
            Some(Confirmation::Yes) => {
                self.pms.cancel_appointment(&existing.id).await?;
                self.audit.record(AuditEvent::new(
                    &record.call_id,
                    AuditKind::AppointmentCancelled,
                    existing.id.clone(),
                ));
                self.availability
                    .invalidate(&existing.provider_id, existing.date);
                Ok(StepOutcome::with_events(
                    TurnResponse::message(
                        CallStep::Completed,
                        format!(
                            "Your appointment on {} at {} has been cancelled. \
                             We hope to see you again soon.",
                            format_date(existing.date),
                            format_time(existing.time)
                        ),
                    ),
                    vec![CallEvent::Advanced(CallStep::Completed)],
                ))
            }
            Some(Confirmation::No) => Ok(StepOutcome::with_events(
                TurnResponse::message(
                    CallStep::Completed,
                    "Okay, your appointment is unchanged. Anything else, just call us back.",
                ),
                vec![CallEvent::Advanced(CallStep::Completed)],
            )),
            None => Ok(StepOutcome::reply(TurnResponse::message(
                record.step,
                "Just to be sure — would you like me to cancel that appointment? Yes or no.",
            ))),
        }
    }

    fn modification(
        &self,
        record: &CallRecord,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let lower = utterance.to_lowercase();

        if lower.contains("insurance") {
            return Ok(StepOutcome::with_events(
                self.insurer_prompt(CallStep::InsuranceVerification, "Sure."),
                vec![CallEvent::ReturnedTo(CallStep::InsuranceVerification)],
            ));
        }
        if lower.contains("provider") || lower.contains("doctor") || lower.contains("clinician") {
            let appointment_type = record.appointment_type.ok_or_else(|| {
                AgentError::Internal("modification without an appointment type".to_string())
            })?;
            let names: Vec<String> = self
                .directory
                .providers_for(appointment_type)
                .iter()
                .map(|p| p.name.clone())
                .collect();
            return Ok(StepOutcome::with_events(
                TurnResponse::message(
                    CallStep::ProviderSelection,
                    format!("Sure. You can see {}. Who would you prefer?", join_names(&names)),
                )
                .with_options(names),
                vec![CallEvent::ReturnedTo(CallStep::ProviderSelection)],
            ));
        }
        if lower.contains("time") {
            let provider_id = record.preferred_provider.clone().ok_or_else(|| {
                AgentError::Internal("modification without a provider".to_string())
            })?;
            let date = record.preferred_date.ok_or_else(|| {
                AgentError::Internal("modification without a date".to_string())
            })?;
            let spoken: Vec<String> = self
                .availability
                .times_for(&provider_id, date)
                .into_iter()
                .take(MAX_SPOKEN_OPTIONS)
                .map(format_time)
                .collect();
            return Ok(StepOutcome::with_events(
                TurnResponse::message(
                    CallStep::TimeSelection,
                    format!(
                        "Sure. On {} the open times include {}. What time would you like?",
                        format_date(date),
                        spoken.join(", ")
                    ),
                )
                .with_options(spoken),
                vec![CallEvent::ReturnedTo(CallStep::TimeSelection)],
            ));
        }
        if lower.contains("date") || lower.contains("day") {
            let provider_id = record.preferred_provider.clone().ok_or_else(|| {
                AgentError::Internal("modification without a provider".to_string())
            })?;
            let (message, options) =
                self.date_prompt(&provider_id, "Sure.", "What day works instead?");
            return Ok(StepOutcome::with_events(
                TurnResponse::message(CallStep::DateSelection, message).with_options(options),
                vec![CallEvent::ReturnedTo(CallStep::DateSelection)],
            ));
        }
        if lower.contains("type") || lower.contains("kind") {
            return Ok(StepOutcome::with_events(
                self.appointment_type_prompt("Sure. Which type of appointment would you like?"),
                vec![CallEvent::ReturnedTo(CallStep::AppointmentType)],
            ));
        }

        Ok(StepOutcome::reply(
            TurnResponse::message(
                record.step,
                "You can change the appointment type, provider, date, time, or \
                 insurance. Which one?",
            )
            .with_options(vec![
                "appointment type".to_string(),
                "provider".to_string(),
                "date".to_string(),
                "time".to_string(),
                "insurance".to_string(),
            ]),
        ))
    }

    // --- prompt helpers -----------------------------------------------

    fn appointment_type_prompt(&self, lead: &str) -> TurnResponse {
        let options: Vec<String> = AppointmentType::all()
            .iter()
            .map(|t| t.display_name().to_string())
            .collect();
        TurnResponse::message(
            CallStep::AppointmentType,
            format!("{lead} We offer {}.", join_names(&options)),
        )
        .with_options(options)
    }

    fn insurer_prompt(&self, step: CallStep, lead: &str) -> TurnResponse {
        let insurers: Vec<String> = accepted_insurers().iter().map(|s| s.to_string()).collect();
        TurnResponse::message(
            step,
            format!("{lead} We accept {}. Which insurance do you have?", insurers.join(", ")),
        )
        .with_options(insurers)
    }

    fn date_prompt(&self, provider_id: &str, lead: &str, question: &str) -> (String, Vec<String>) {
        let dates = self.directory.available_dates(provider_id, today());
        let spoken: Vec<String> = dates
            .iter()
            .take(MAX_SPOKEN_OPTIONS)
            .map(|&d| format_date(d))
            .collect();
        (
            format!(
                "{lead} The next openings are {}, and more. {question}",
                spoken.join(", ")
            ),
            spoken,
        )
    }

    fn provider_name(&self, provider_id: &str) -> String {
        self.directory
            .provider_by_id(provider_id)
            .map(|p| p.name)
            .unwrap_or_else(|| provider_id.to_string())
    }

    fn booking_summary(&self, record: &CallRecord) -> String {
        let what = record
            .appointment_type
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| "appointment".to_string());
        match &record.selected_slot {
            Some(slot) => format!(
                "That's a {what} with {} on {} at {}.",
                self.provider_name(&slot.provider_id),
                format_date(slot.date),
                format_time(slot.time)
            ),
            None => format!("That's a {what}."),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

fn join_names(names: &[String]) -> String {
    match names.len() {
        0 => String::new(),
        1 => names[0].clone(),
        _ => format!(
            "{} or {}",
            names[..names.len() - 1].join(", "),
            names[names.len() - 1]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&["A".to_string()]), "A");
        assert_eq!(
            join_names(&["A".to_string(), "B".to_string(), "C".to_string()]),
            "A, B or C"
        );
    }

    #[test]
    fn test_format_time_is_12_hour() {
        let time = NaiveTime::from_hms_opt(15, 30, 0).unwrap();
        assert_eq!(format_time(time), "3:30 PM");
    }
}
