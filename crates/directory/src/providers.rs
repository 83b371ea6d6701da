//! Provider roster loading
//!
//! The roster lives in a JSON file (`data/providers.json` by default) and
//! falls back to an embedded default set when the file is absent, so the
//! agent always has someone to offer.

use chrono::{NaiveTime, Weekday};
use frontdesk_core::AppointmentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One clinician on the roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    /// Appointment types this provider sees; empty means all of them
    #[serde(default)]
    pub appointment_types: Vec<AppointmentType>,
    /// Weekly working hours keyed by lowercase weekday name; a missing day
    /// means the provider is out
    pub schedule: HashMap<String, DayHours>,
}

/// Working hours for a single weekday, HH:MM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub start: String,
    pub end: String,
}

impl Provider {
    /// Whether this provider sees the given appointment type
    pub fn serves(&self, appointment_type: AppointmentType) -> bool {
        self.appointment_types.is_empty() || self.appointment_types.contains(&appointment_type)
    }

    /// Parsed working hours for a weekday, `None` when off or unparseable
    pub fn hours_on(&self, weekday: Weekday) -> Option<(NaiveTime, NaiveTime)> {
        let hours = self.schedule.get(weekday_key(weekday))?;
        let start = NaiveTime::parse_from_str(&hours.start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&hours.end, "%H:%M").ok()?;
        (start < end).then_some((start, end))
    }
}

pub(crate) fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[derive(Debug, Deserialize)]
struct ProviderFile {
    providers: Vec<Provider>,
}

/// Load the roster from a JSON file
pub fn load_providers_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Provider>, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let file: ProviderFile = serde_json::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(file.providers)
}

/// Embedded default roster (fallback when no file is configured)
pub fn default_providers() -> Vec<Provider> {
    let weekday_hours = |days: &[&str], start: &str, end: &str| {
        days.iter()
            .map(|day| {
                (
                    day.to_string(),
                    DayHours {
                        start: start.to_string(),
                        end: end.to_string(),
                    },
                )
            })
            .collect::<HashMap<_, _>>()
    };

    vec![
        Provider {
            id: "dr-patel".to_string(),
            name: "Dr. Anita Patel".to_string(),
            appointment_types: vec![],
            schedule: weekday_hours(
                &["monday", "tuesday", "wednesday", "thursday", "friday"],
                "09:00",
                "17:00",
            ),
        },
        Provider {
            id: "dr-reyes".to_string(),
            name: "Dr. Marcus Reyes".to_string(),
            appointment_types: vec![],
            schedule: weekday_hours(&["monday", "wednesday", "friday"], "08:00", "16:00"),
        },
        Provider {
            id: "np-chen".to_string(),
            name: "Lena Chen, PMHNP".to_string(),
            appointment_types: vec![AppointmentType::FollowUp],
            schedule: weekday_hours(&["tuesday", "thursday"], "10:00", "18:00"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_roster() {
        let providers = default_providers();
        assert_eq!(providers.len(), 3);
        assert!(providers.iter().all(|p| !p.schedule.is_empty()));
    }

    #[test]
    fn test_serves() {
        let providers = default_providers();
        let chen = providers.iter().find(|p| p.id == "np-chen").unwrap();
        assert!(chen.serves(AppointmentType::FollowUp));
        assert!(!chen.serves(AppointmentType::KetamineConsultation));

        let patel = providers.iter().find(|p| p.id == "dr-patel").unwrap();
        assert!(patel.serves(AppointmentType::ComprehensiveEvaluation));
    }

    #[test]
    fn test_hours_on() {
        let providers = default_providers();
        let reyes = providers.iter().find(|p| p.id == "dr-reyes").unwrap();
        let (start, end) = reyes.hours_on(Weekday::Mon).unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert!(reyes.hours_on(Weekday::Tue).is_none());
        assert!(reyes.hours_on(Weekday::Sun).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"providers": [{{"id": "dr-test", "name": "Dr. Test",
                 "schedule": {{"monday": {{"start": "09:00", "end": "12:00"}}}}}}]}}"#
        )
        .unwrap();

        let providers = load_providers_from_file(file.path()).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "dr-test");
        assert!(providers[0].hours_on(Weekday::Mon).is_some());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_providers_from_file("/nonexistent/providers.json").is_err());
    }
}
