//! Clinic domain directory: who works when, and which insurance we take
//!
//! The [`Directory`] owns the provider roster (JSON file with embedded
//! defaults) and answers the scheduling questions the step handlers ask:
//! which providers serve an appointment type, which dates and times a
//! provider has, and whether a named insurer is accepted.

pub mod insurers;
pub mod providers;
pub mod schedule;

pub use insurers::{accepted_insurers, is_accepted_insurer, match_insurer, InsurerMatch};
pub use providers::{load_providers_from_file, DayHours, Provider};
pub use schedule::SlotRules;

use chrono::{NaiveDate, NaiveTime};
use frontdesk_core::AppointmentType;
use parking_lot::RwLock;
use std::path::Path;

/// Provider roster plus slot-generation rules
pub struct Directory {
    providers: RwLock<Vec<Provider>>,
    rules: SlotRules,
}

impl Directory {
    pub fn new(providers: Vec<Provider>, rules: SlotRules) -> Self {
        Self {
            providers: RwLock::new(providers),
            rules,
        }
    }

    /// Embedded default roster
    pub fn with_defaults(rules: SlotRules) -> Self {
        Self::new(providers::default_providers(), rules)
    }

    /// Load the roster from a file, falling back to the embedded defaults
    /// when the file cannot be read
    pub fn load(path: &Path, rules: SlotRules) -> Self {
        match providers::load_providers_from_file(path) {
            Ok(providers) => {
                tracing::info!(
                    count = providers.len(),
                    path = %path.display(),
                    "loaded provider roster"
                );
                Self::new(providers, rules)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not load provider roster, using embedded defaults"
                );
                Self::with_defaults(rules)
            }
        }
    }

    /// Replace the roster from a file at runtime
    pub fn reload(&self, path: &Path) -> Result<usize, std::io::Error> {
        let providers = providers::load_providers_from_file(path)?;
        let count = providers.len();
        *self.providers.write() = providers;
        tracing::info!(count, path = %path.display(), "reloaded provider roster");
        Ok(count)
    }

    pub fn rules(&self) -> &SlotRules {
        &self.rules
    }

    /// Providers who see the given appointment type, in roster order
    pub fn providers_for(&self, appointment_type: AppointmentType) -> Vec<Provider> {
        self.providers
            .read()
            .iter()
            .filter(|p| p.serves(appointment_type))
            .cloned()
            .collect()
    }

    pub fn provider_by_id(&self, id: &str) -> Option<Provider> {
        self.providers.read().iter().find(|p| p.id == id).cloned()
    }

    /// Match an utterance against the candidates for an appointment type.
    /// Any name token of three or more letters counts, so "Patel",
    /// "Dr. Patel" and "Anita Patel please" all resolve; first candidate
    /// with a matching token wins.
    pub fn find_provider(
        &self,
        utterance: &str,
        appointment_type: AppointmentType,
    ) -> Option<Provider> {
        let lower = utterance.to_lowercase();
        self.providers_for(appointment_type)
            .into_iter()
            .find(|p| name_tokens(&p.name).iter().any(|t| lower.contains(t)))
    }

    /// Dates within the horizon on which the provider works
    pub fn available_dates(&self, provider_id: &str, today: NaiveDate) -> Vec<NaiveDate> {
        match self.provider_by_id(provider_id) {
            Some(provider) => schedule::available_dates(&provider, today, &self.rules),
            None => Vec::new(),
        }
    }

    /// Slot start times for a provider-day
    pub fn available_times(&self, provider_id: &str, date: NaiveDate) -> Vec<NaiveTime> {
        match self.provider_by_id(provider_id) {
            Some(provider) => schedule::available_times(&provider, date, &self.rules),
            None => Vec::new(),
        }
    }
}

// Titles and credentials are not useful match tokens.
const NAME_STOPWORDS: &[&str] = &["dr", "dr.", "np", "pa", "pmhnp", "md", "do"];

fn name_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split([' ', ','])
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| t.len() >= 3 && !NAME_STOPWORDS.contains(&t.as_str()))
        .collect()
}
