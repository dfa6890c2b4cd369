use std::collections::HashMap;

use serde::Serialize;

use crate::models::Registration;

pub const DEFAULT_SMOKE_COLOR: &str = "#6366f1";

const CAUSE_COLORS: [(&str, &str); 10] = [
    ("environment", "#22c55e"),
    ("education", "#3b82f6"),
    ("health", "#ef4444"),
    ("animals", "#f97316"),
    ("community", "#a855f7"),
    ("hunger", "#eab308"),
    ("seniors", "#14b8a6"),
    ("youth", "#ec4899"),
    ("disaster-relief", "#dc2626"),
    ("arts", "#8b5cf6"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalizationContext {
    pub cause: Option<String>,
    pub smoke_color: String,
    pub variant: Option<String>,
}

impl Default for PersonalizationContext {
    fn default() -> Self {
        Self {
            cause: None,
            smoke_color: DEFAULT_SMOKE_COLOR.to_string(),
            variant: None,
        }
    }
}

/// Slug form of a cause name: `Disaster Relief` -> `disaster-relief`.
pub fn cause_key(cause: &str) -> String {
    cause.trim().to_lowercase().replace([' ', '_'], "-")
}

pub fn smoke_color_for(cause: &str) -> &'static str {
    let cause = cause_key(cause);
    CAUSE_COLORS
        .iter()
        .find(|(slug, _)| *slug == cause)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_SMOKE_COLOR)
}

pub fn latest_registration(registrations: &[Registration]) -> Option<&Registration> {
    registrations.iter().max_by_key(|r| r.registered_at)
}

/// Picks the visitor's cause from their most recent sign-up.
pub fn personalize(
    registrations: &[Registration],
    variants: &HashMap<String, String>,
) -> PersonalizationContext {
    let Some(cause) = latest_registration(registrations).and_then(Registration::primary_cause)
    else {
        return PersonalizationContext::default();
    };
    let cause = cause_key(cause);

    PersonalizationContext {
        smoke_color: smoke_color_for(&cause).to_string(),
        variant: variants.get(&cause).cloned(),
        cause: Some(cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn registration(uid: &str, day: u32, causes: &[&str]) -> Registration {
        Registration {
            opportunity_uid: uid.to_string(),
            opportunity_title: format!("Opportunity {}", uid),
            causes: causes.iter().map(|c| c.to_string()).collect(),
            name: "Priya".to_string(),
            email: "priya@example.org".to_string(),
            phone: None,
            registered_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_registrations_gives_default() {
        assert_eq!(personalize(&[], &HashMap::new()), PersonalizationContext::default());
    }

    #[test]
    fn test_uses_first_cause_of_most_recent_registration() {
        let registrations = vec![
            registration("old", 1, &["health"]),
            registration("new", 9, &["Environment", "education"]),
            registration("mid", 5, &["animals"]),
        ];
        let variants = HashMap::from([("environment".to_string(), "0_1".to_string())]);

        let context = personalize(&registrations, &variants);
        assert_eq!(context.cause.as_deref(), Some("environment"));
        assert_eq!(context.smoke_color, "#22c55e");
        assert_eq!(context.variant.as_deref(), Some("0_1"));
    }

    #[test]
    fn test_unknown_cause_uses_default_color() {
        let context = personalize(&[registration("x", 2, &["astronomy"])], &HashMap::new());
        assert_eq!(context.cause.as_deref(), Some("astronomy"));
        assert_eq!(context.smoke_color, DEFAULT_SMOKE_COLOR);
        assert!(context.variant.is_none());
    }

    #[test]
    fn test_registration_without_causes() {
        let context = personalize(&[registration("x", 2, &["  "])], &HashMap::new());
        assert_eq!(context, PersonalizationContext::default());
    }

    #[test]
    fn test_multi_word_cause_finds_color_and_variant() {
        let variants = HashMap::from([("disaster-relief".to_string(), "0_4".to_string())]);
        let context = personalize(&[registration("flood", 3, &["Disaster Relief"])], &variants);
        assert_eq!(context.cause.as_deref(), Some("disaster-relief"));
        assert_eq!(context.smoke_color, "#dc2626");
        assert_eq!(context.variant.as_deref(), Some("0_4"));
    }

    #[test]
    fn test_color_lookup_normalizes() {
        assert_eq!(smoke_color_for("Disaster Relief"), "#dc2626");
        assert_eq!(smoke_color_for("disaster_relief"), "#dc2626");
    }
}
