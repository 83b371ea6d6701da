//! Rule-based field extraction from caller utterances
//!
//! Every extractor in this crate is a pure function: no side effects,
//! idempotent, and returning either a typed value or "no match". Missing
//! fields are ordinary conversational outcomes handled by re-prompting, so
//! nothing here returns an error.
//!
//! Classification is deliberately keyword/regex based. The conversation is
//! scripted and the vocabulary is small; a statistical model would change
//! the contract without improving the flow.

pub mod appointment;
pub mod confirmation;
pub mod datetime;
pub mod identity;
pub mod intent;

pub use appointment::extract_appointment_type;
pub use confirmation::{extract_confirmation, Confirmation};
pub use datetime::{extract_date, extract_time};
pub use identity::{extract_identity_fields, IdentityFields};
pub use intent::{classify_intent, CallIntent};
