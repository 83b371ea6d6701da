//! Core types for the clinic call-handling agent
//!
//! This crate provides the shared vocabulary used across all other crates:
//! - Call step enum with the scripted flow's transition table
//! - Conversation turn/history types
//! - Appointment, client, insurance and slot value types
//! - The per-turn response payload returned to the calling layer

pub mod call;
pub mod conversation;
pub mod types;

pub use call::CallStep;
pub use conversation::{Turn, TurnRole};
pub use types::{
    AppointmentRef, AppointmentType, ClientInfo, InsuranceInfo, Slot, TurnResponse,
};
