//! Collaborator integrations for the call-handling agent
//!
//! - [`integrations`]: practice-management and insurance-eligibility
//!   contracts with development stubs
//! - [`cache`]: TTL-bounded read-through availability cache
//! - [`audit`]: structured audit-event sink

pub mod audit;
pub mod cache;
pub mod integrations;

pub use audit::{AuditEvent, AuditKind, AuditSink, TracingAuditSink};
pub use cache::AvailabilityCache;
pub use integrations::{
    BookingRequest, EligibilityOutcome, IdentityOutcome, InsuranceEligibility, IntegrationError,
    PracticeManagement, StubInsuranceEligibility, StubPracticeManagement,
};
