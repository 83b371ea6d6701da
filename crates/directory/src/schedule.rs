//! Slot generation over provider weekly schedules

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::providers::Provider;

/// Slot-generation parameters, derived from runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRules {
    /// Slot granularity in minutes
    pub slot_minutes: u32,
    /// Scan horizon in calendar days, starting tomorrow
    pub horizon_days: u32,
    /// Lunch exclusion window start (inclusive)
    pub lunch_start: NaiveTime,
    /// Lunch exclusion window end (exclusive)
    pub lunch_end: NaiveTime,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            slot_minutes: 15,
            horizon_days: 30,
            lunch_start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            lunch_end: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        }
    }
}

/// Dates within the horizon on which the provider works, chronological.
/// The horizon starts tomorrow; same-day booking is never offered.
pub fn available_dates(provider: &Provider, today: NaiveDate, rules: &SlotRules) -> Vec<NaiveDate> {
    (1..=rules.horizon_days as i64)
        .filter_map(|offset| {
            let date = today + Duration::days(offset);
            provider.hours_on(date.weekday()).map(|_| date)
        })
        .collect()
}

/// Slot start times for one provider-day: fixed granularity from opening
/// to closing (exclusive), skipping the lunch window. Empty when the
/// provider is off that day.
///
/// Appointment-type duration is not considered; every slot is offered at
/// the configured granularity regardless of what is being booked.
pub fn available_times(provider: &Provider, date: NaiveDate, rules: &SlotRules) -> Vec<NaiveTime> {
    let Some((start, end)) = provider.hours_on(date.weekday()) else {
        return Vec::new();
    };

    let step = Duration::minutes(rules.slot_minutes as i64);
    let mut times = Vec::new();
    let mut cursor = start;
    while cursor < end {
        if cursor < rules.lunch_start || cursor >= rules.lunch_end {
            times.push(cursor);
        }
        cursor += step;
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::default_providers;

    fn patel() -> Provider {
        default_providers()
            .into_iter()
            .find(|p| p.id == "dr-patel")
            .unwrap()
    }

    #[test]
    fn test_dates_start_tomorrow() {
        // A Monday; Dr. Patel works weekdays only.
        let today = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let dates = available_dates(&patel(), today, &SlotRules::default());

        assert!(!dates.contains(&today));
        assert_eq!(dates[0], today + Duration::days(1));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        // No weekends in a weekday-only schedule.
        assert!(dates
            .iter()
            .all(|d| d.weekday().number_from_monday() <= 5));
        // 30-day horizon from a Monday covers 22 working days.
        assert_eq!(dates.len(), 22);
    }

    #[test]
    fn test_times_respect_hours_and_lunch() {
        // A Tuesday, within Dr. Patel's 09:00-17:00.
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        let times = available_times(&patel(), date, &SlotRules::default());

        let first = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let last = NaiveTime::from_hms_opt(16, 45, 0).unwrap();
        assert_eq!(times.first(), Some(&first));
        assert_eq!(times.last(), Some(&last));
        // Closing time itself is never a slot.
        assert!(!times.contains(&NaiveTime::from_hms_opt(17, 0, 0).unwrap()));

        // Lunch window [13:00, 14:00) is carved out.
        assert!(!times.contains(&NaiveTime::from_hms_opt(13, 0, 0).unwrap()));
        assert!(!times.contains(&NaiveTime::from_hms_opt(13, 45, 0).unwrap()));
        assert!(times.contains(&NaiveTime::from_hms_opt(12, 45, 0).unwrap()));
        assert!(times.contains(&NaiveTime::from_hms_opt(14, 0, 0).unwrap()));

        // 8 working hours minus lunch = 7h at 15-minute granularity.
        assert_eq!(times.len(), 28);
    }

    #[test]
    fn test_times_empty_on_day_off() {
        // A Saturday.
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert!(available_times(&patel(), date, &SlotRules::default()).is_empty());
    }

    #[test]
    fn test_custom_granularity() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        let rules = SlotRules {
            slot_minutes: 60,
            ..Default::default()
        };
        let times = available_times(&patel(), date, &rules);
        // 09..17 hourly minus the 13:00 slot.
        assert_eq!(times.len(), 7);
    }
}
