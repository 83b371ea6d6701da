//! Appointment type extraction

use frontdesk_core::AppointmentType;

const COMPREHENSIVE_KEYWORDS: &[&str] = &[
    "comprehensive",
    "evaluation",
    "new patient",
    "first visit",
    "first appointment",
    "initial",
];

const FOLLOW_UP_KEYWORDS: &[&str] = &["follow up", "follow-up", "followup", "check in", "check-in"];

const KETAMINE_KEYWORDS: &[&str] = &["ketamine", "infusion"];

/// Map an utterance onto an appointment type, first keyword group wins.
pub fn extract_appointment_type(utterance: &str) -> Option<AppointmentType> {
    let lower = utterance.to_lowercase();

    for keyword in COMPREHENSIVE_KEYWORDS {
        if lower.contains(keyword) {
            return Some(AppointmentType::ComprehensiveEvaluation);
        }
    }
    for keyword in FOLLOW_UP_KEYWORDS {
        if lower.contains(keyword) {
            return Some(AppointmentType::FollowUp);
        }
    }
    for keyword in KETAMINE_KEYWORDS {
        if lower.contains(keyword) {
            return Some(AppointmentType::KetamineConsultation);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comprehensive() {
        assert_eq!(
            extract_appointment_type("I'm a new patient"),
            Some(AppointmentType::ComprehensiveEvaluation)
        );
        assert_eq!(
            extract_appointment_type("a comprehensive evaluation please"),
            Some(AppointmentType::ComprehensiveEvaluation)
        );
    }

    #[test]
    fn test_follow_up() {
        assert_eq!(
            extract_appointment_type("just a follow-up with my doctor"),
            Some(AppointmentType::FollowUp)
        );
        assert_eq!(
            extract_appointment_type("a followup visit"),
            Some(AppointmentType::FollowUp)
        );
    }

    #[test]
    fn test_ketamine() {
        assert_eq!(
            extract_appointment_type("the ketamine consultation"),
            Some(AppointmentType::KetamineConsultation)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_appointment_type("umm, I'm not sure"), None);
        assert_eq!(extract_appointment_type(""), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            extract_appointment_type("KETAMINE"),
            Some(AppointmentType::KetamineConsultation)
        );
    }
}
