//! Dialogue driver
//!
//! The outward-facing surface of the agent: one object the transport layer
//! calls with `start_call`, `handle_turn`, `end_call`. The record's mutex is
//! held for the whole turn (snapshot, handler, event application), so two
//! messages for the same call can never act on the same snapshot, and a
//! failure anywhere leaves the record exactly as it was.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use frontdesk_core::{CallStep, TurnResponse};
use frontdesk_tools::{AuditEvent, AuditKind, AuditSink};

use crate::record::CallEvent;
use crate::steps::StepHandlers;
use crate::store::CallStore;
use crate::AgentError;

/// Fixed response for anything the agent cannot recover from. Callers hear
/// the same message whether the call id was unknown or a backend fell over;
/// the distinction lives in the logs.
const TRANSFER_MESSAGE: &str =
    "I'm sorry, I'm having trouble with that right now. Let me transfer you to \
     our front desk staff.";

const OPENING_MESSAGE: &str =
    "Thank you for calling Harborview Behavioral Health. This is the scheduling \
     assistant. How can I help you today?";

pub struct DialogueDriver {
    store: Arc<CallStore>,
    handlers: StepHandlers,
    audit: Arc<dyn AuditSink>,
}

impl DialogueDriver {
    pub fn new(store: Arc<CallStore>, handlers: StepHandlers, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            handlers,
            audit,
        }
    }

    pub fn store(&self) -> &Arc<CallStore> {
        &self.store
    }

    /// Register a new call and return the opening prompt. The prompt is not
    /// part of the transcript: history holds exactly one user/agent pair per
    /// handled turn. A duplicate call id is surfaced to the transport layer;
    /// the existing conversation is never reset.
    pub async fn start_call(&self, call_id: &str) -> Result<TurnResponse, AgentError> {
        self.store.create(call_id)?;
        self.audit
            .record(AuditEvent::new(call_id, AuditKind::CallStarted, ""));
        Ok(TurnResponse::message(CallStep::Greeting, OPENING_MESSAGE))
    }

    /// Handle one caller utterance. Never fails from the caller's point of
    /// view: any internal error becomes the generic transfer response and
    /// the record is left untouched.
    pub async fn handle_turn(&self, call_id: &str, utterance: &str) -> TurnResponse {
        match self.try_handle_turn(call_id, utterance).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    AgentError::UnknownCall(id) => {
                        tracing::warn!(call_id = %id, "turn for unknown call");
                    }
                    other => {
                        tracing::error!(call_id = %call_id, error = %other, "turn failed");
                    }
                }
                self.audit.record(AuditEvent::new(
                    call_id,
                    AuditKind::TransferOffered,
                    e.to_string(),
                ));
                let step = self
                    .store
                    .snapshot(call_id)
                    .await
                    .map(|r| r.step)
                    .unwrap_or(CallStep::Greeting);
                TurnResponse::message(step, TRANSFER_MESSAGE).with_transfer_required()
            }
        }
    }

    async fn try_handle_turn(
        &self,
        call_id: &str,
        utterance: &str,
    ) -> Result<TurnResponse, AgentError> {
        // The mutex is held from snapshot through event application: a
        // second message for the same call waits here until this one has
        // committed, so it always sees the post-turn state.
        let record = self
            .store
            .get(call_id)
            .ok_or_else(|| AgentError::UnknownCall(call_id.to_string()))?;
        let mut guard = record.lock().await;
        let snapshot = guard.clone();

        // Terminal calls take no further turns; reply without mutating.
        if snapshot.step.is_terminal() {
            return Ok(self
                .handlers
                .handle(&snapshot, utterance)
                .await?
                .response);
        }

        tracing::debug!(
            call_id = %call_id,
            step = %snapshot.step,
            "handling turn"
        );

        let outcome = AssertUnwindSafe(self.handlers.handle(&snapshot, utterance))
            .catch_unwind()
            .await
            .map_err(|_| AgentError::Internal("step handler panicked".to_string()))??;

        guard.apply(CallEvent::UserSaid(utterance.to_string()));
        for event in outcome.events {
            guard.apply(event);
        }
        guard.apply(CallEvent::AgentSaid(outcome.response.message.clone()));

        Ok(outcome.response)
    }

    /// Tear down a call's state. Idempotent; ending an unknown call is a
    /// no-op so hangup notifications can arrive more than once.
    pub async fn end_call(&self, call_id: &str) {
        if self.store.snapshot(call_id).await.is_some() {
            self.audit
                .record(AuditEvent::new(call_id, AuditKind::CallEnded, ""));
        }
        self.store.remove(call_id);
    }

    /// Start the background stale-record sweep; returns its shutdown handle
    pub fn start_sweep_task(&self, interval: Duration) -> tokio::sync::watch::Sender<bool> {
        self.store.start_sweep_task(interval)
    }
}
