//! Date and time extraction

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

// ISO YYYY-MM-DD.
static DATE_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("date regex is valid"));

// US MM/DD/YYYY.
static DATE_US_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("date regex is valid"));

// "3 pm", "3:30pm", "15:00". Meridiem optional only when minutes are given,
// otherwise a bare "3" would match almost anything.
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}):(\d{2})\s*(am|pm|AM|PM)?\b|\b(\d{1,2})\s*(am|pm|AM|PM)\b")
        .expect("time regex is valid")
});

/// Extract a calendar date from an utterance. Unlike identity extraction,
/// the result is a real `NaiveDate`, so impossible dates do not match.
pub fn extract_date(utterance: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_ISO_RE.captures(utterance) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = DATE_US_RE.captures(utterance) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// Extract a clock time, normalized to 24h. "12 am" maps to midnight and
/// "12 pm" to noon.
pub fn extract_time(utterance: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(utterance)?;

    let (hour, minute, meridiem) = if let Some(h) = caps.get(1) {
        (
            h.as_str().parse::<u32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            caps.get(3).map(|m| m.as_str().to_lowercase()),
        )
    } else {
        (
            caps[4].parse::<u32>().ok()?,
            0,
            caps.get(5).map(|m| m.as_str().to_lowercase()),
        )
    };

    let hour = match meridiem.as_deref() {
        Some("pm") if hour < 12 => hour + 12,
        Some("am") if hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date() {
        assert_eq!(
            extract_date("how about 2026-09-14?"),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
    }

    #[test]
    fn test_us_date() {
        assert_eq!(
            extract_date("let's do 9/14/2026"),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
    }

    #[test]
    fn test_impossible_date_rejected() {
        assert_eq!(extract_date("13/45/2026"), None);
        assert_eq!(extract_date("2026-02-30"), None);
    }

    #[test]
    fn test_time_with_meridiem() {
        assert_eq!(
            extract_time("3 pm works"),
            NaiveTime::from_hms_opt(15, 0, 0)
        );
        assert_eq!(
            extract_time("how about 9:30am"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(extract_time("12 pm"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(extract_time("12 am"), NaiveTime::from_hms_opt(0, 0, 0));
    }

    #[test]
    fn test_24h_time() {
        assert_eq!(extract_time("15:45"), NaiveTime::from_hms_opt(15, 45, 0));
        assert_eq!(extract_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
    }

    #[test]
    fn test_bare_number_is_not_a_time() {
        assert_eq!(extract_time("I have 3 kids"), None);
        assert_eq!(extract_time("no time here"), None);
    }

    #[test]
    fn test_out_of_range_hour_rejected() {
        assert_eq!(extract_time("25:00"), None);
    }
}
