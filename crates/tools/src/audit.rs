//! Audit event sink
//!
//! Every consequential moment of a call (identity checks, bookings,
//! cancellations, transfers) is recorded as a structured event. The default
//! sink writes them to the `audit` tracing target; durable persistence is a
//! deployment concern behind the same trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    CallStarted,
    IdentityVerified,
    IdentityRejected,
    SlotSelected,
    InsuranceAccepted,
    SelfPayElected,
    AppointmentBooked,
    AppointmentRescheduled,
    AppointmentCancelled,
    TransferOffered,
    CallEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub call_id: String,
    pub kind: AuditKind,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(call_id: impl Into<String>, kind: AuditKind, detail: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            kind,
            detail: detail.into(),
            at: Utc::now(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default sink: structured tracing events on the `audit` target
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            call_id = %event.call_id,
            kind = ?event.kind,
            detail = %event.detail,
            at = %event.at,
            "audit event"
        );
    }
}
