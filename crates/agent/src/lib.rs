//! Conversation state machine for the clinic scheduling line
//!
//! The [`DialogueDriver`] drives a scripted, step-indexed conversation:
//! greeting, identity verification, appointment/provider/date/time
//! selection, insurance verification, final confirmation — plus the
//! reschedule and cancel flows. State lives in a [`CallStore`] keyed by
//! call id; step handlers compute events against snapshots and the driver
//! applies them atomically per call.

pub mod driver;
pub mod record;
pub mod steps;
pub mod store;

pub use driver::DialogueDriver;
pub use record::{CallEvent, CallRecord};
pub use steps::{StepHandlers, StepOutcome};
pub use store::CallStore;

use std::sync::Arc;
use std::time::Duration;

use frontdesk_config::Settings;
use frontdesk_directory::{Directory, SlotRules};
use frontdesk_tools::{
    AuditSink, AvailabilityCache, InsuranceEligibility, IntegrationError, PracticeManagement,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Unknown call: {0}")]
    UnknownCall(String),

    #[error("Duplicate call: {0}")]
    DuplicateCall(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error("Configuration error: {0}")]
    Config(#[from] frontdesk_config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IntegrationError> for AgentError {
    fn from(err: IntegrationError) -> Self {
        AgentError::Collaborator(err.to_string())
    }
}

/// Wire a driver from settings and collaborator implementations.
///
/// The directory is loaded from `settings.directory_path` (embedded
/// defaults when absent), the availability cache and stale sweep pick up
/// their TTLs from the conversation config.
pub fn build_driver(
    settings: &Settings,
    pms: Arc<dyn PracticeManagement>,
    eligibility: Arc<dyn InsuranceEligibility>,
    audit: Arc<dyn AuditSink>,
) -> Result<DialogueDriver, AgentError> {
    let (lunch_start, lunch_end) = settings.scheduling.lunch_window()?;
    let rules = SlotRules {
        slot_minutes: settings.scheduling.slot_minutes,
        horizon_days: settings.scheduling.horizon_days,
        lunch_start,
        lunch_end,
    };
    let directory = Arc::new(Directory::load(
        std::path::Path::new(&settings.directory_path),
        rules,
    ));

    let availability = Arc::new(AvailabilityCache::new(
        Arc::clone(&directory),
        Duration::from_secs(settings.conversation.availability_ttl_secs),
    ));
    let store = Arc::new(CallStore::new(Duration::from_secs(
        settings.conversation.stale_after_secs,
    )));

    let handlers = StepHandlers::new(
        directory,
        pms,
        eligibility,
        availability,
        Arc::clone(&audit),
    );
    Ok(DialogueDriver::new(store, handlers, audit))
}
