use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::security::APPROVAL_SECRET_HEADER;
use crate::models::{parse_cms_date, CreatedEvent, EventStatus};
use crate::services::automate::{Notifier, WebhookKind};
use crate::services::contentstack::ContentManager;
use crate::services::opportunities::OPPORTUNITY_CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};
use crate::utils::validation::{json_body, require_email, require_non_empty, secrets_match};

const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSubmission {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub is_virtual: bool,
    pub causes: Vec<String>,
    pub organizer_name: String,
    pub organizer_email: String,
}

fn parse_date_field(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_cms_date(raw).ok_or_else(|| {
        AppError::ValidationError(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

impl EventSubmission {
    pub fn validate(self, now: DateTime<Utc>) -> Result<CreatedEvent, AppError> {
        let title = require_non_empty("title", &self.title)?;
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::ValidationError(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let start_date = parse_date_field("startDate", &require_non_empty("startDate", &self.start_date)?)?;
        if start_date < now.date_naive() {
            return Err(AppError::ValidationError(
                "startDate cannot be in the past".to_string(),
            ));
        }

        let end_date = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date_field("endDate", raw)?),
        };
        if end_date.is_some_and(|end| end < start_date) {
            return Err(AppError::ValidationError(
                "endDate cannot be before startDate".to_string(),
            ));
        }

        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        if location.is_none() && !self.is_virtual {
            return Err(AppError::ValidationError(
                "location is required for in-person events".to_string(),
            ));
        }

        Ok(CreatedEvent {
            id: Uuid::new_v4(),
            title,
            description: require_non_empty("description", &self.description)?,
            start_date,
            end_date,
            location,
            is_virtual: self.is_virtual,
            causes: self
                .causes
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            organizer_name: require_non_empty("organizerName", &self.organizer_name)?,
            organizer_email: require_email("organizerEmail", &self.organizer_email)?,
            status: EventStatus::Pending,
            entry_uid: None,
            created_at: now,
        })
    }
}

/// Stores a community submission as an unpublished CMS entry pending review.
pub async fn submit_event(
    State(state): State<AppState>,
    payload: Result<Json<EventSubmission>, JsonRejection>,
) -> Result<Response, AppError> {
    let mut event = json_body(payload)?.validate(Utc::now())?;

    let manager = state.manager.as_ref().ok_or_else(|| {
        AppError::NotConfigured("Event submission is not available".to_string())
    })?;

    let entry_uid = manager
        .create_entry(OPPORTUNITY_CONTENT_TYPE, event.to_cms_entry())
        .await?;
    event.entry_uid = Some(entry_uid);

    tracing::info!(
        event_id = %event.id,
        entry_uid = ?event.entry_uid,
        "Event submitted for review"
    );

    state
        .notifier
        .notify(
            WebhookKind::EventSubmission,
            json!({ "type": "event_submission", "event": event }),
        )
        .await;

    Ok(created(event, "Event submitted for review"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    #[serde(default)]
    pub entry_uid: String,
    #[serde(default = "default_decision")]
    pub status: EventStatus,
}

fn default_decision() -> EventStatus {
    EventStatus::Approved
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub entry_uid: String,
    pub status: EventStatus,
    pub published: bool,
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Moderator decision on a pending submission; approval also publishes it.
pub async fn approve_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let expected = state
        .config
        .approval_secret
        .as_deref()
        .ok_or_else(|| AppError::NotConfigured("Event approval is not available".to_string()))?;
    let provided = headers
        .get(APPROVAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(expected, provided) {
        return Err(AppError::AuthError("Invalid approval secret".to_string()));
    }

    let request = json_body(payload)?;
    let entry_uid = require_non_empty("entryUid", &request.entry_uid)?;
    if request.status == EventStatus::Pending {
        return Err(AppError::ValidationError(
            "status must be approved or rejected".to_string(),
        ));
    }

    let manager = state.manager.as_ref().ok_or_else(|| {
        AppError::NotConfigured("Event approval is not available".to_string())
    })?;

    let mut entry = manager
        .fetch_entry(OPPORTUNITY_CONTENT_TYPE, &entry_uid)
        .await?;
    if let Some(fields) = entry.as_object_mut() {
        fields.insert("approval_status".to_string(), json!(request.status));
    }
    manager
        .update_entry(OPPORTUNITY_CONTENT_TYPE, &entry_uid, entry.clone())
        .await?;

    let published = request.status == EventStatus::Approved;
    if published {
        manager
            .publish_entry(OPPORTUNITY_CONTENT_TYPE, &entry_uid)
            .await?;
    }

    tracing::info!(entry_uid = %entry_uid, status = request.status.as_str(), "Event moderated");

    state
        .notifier
        .notify(
            WebhookKind::EventApproval,
            json!({
                "type": "event_approval",
                "entryUid": entry_uid,
                "status": request.status,
                "title": string_field(&entry, "title"),
                "organizerName": string_field(&entry, "organizer_name"),
                "organizerEmail": string_field(&entry, "organizer_email"),
            }),
        )
        .await;

    Ok(success(
        ApprovalOutcome {
            entry_uid,
            status: request.status,
            published,
        },
        "Event moderation recorded",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn submission() -> EventSubmission {
        EventSubmission {
            title: "Lake cleanup".to_string(),
            description: "Clearing plastic from the lake shore".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: Some("2025-06-11".to_string()),
            location: Some("Powai Lake".to_string()),
            is_virtual: false,
            causes: vec!["Environment".to_string()],
            organizer_name: "Lake Friends".to_string(),
            organizer_email: "team@lakefriends.org".to_string(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let event = submission().validate(now()).unwrap();
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.causes, vec!["environment"]);
        assert_eq!(event.end_date, NaiveDate::from_ymd_opt(2025, 6, 11));
        assert!(event.entry_uid.is_none());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut bad = submission();
        bad.end_date = Some("2025-06-09".to_string());
        assert!(bad.validate(now()).is_err());
    }

    #[test]
    fn test_past_start_rejected() {
        let mut bad = submission();
        bad.start_date = "2025-05-31".to_string();
        assert!(bad.validate(now()).is_err());
    }

    #[test]
    fn test_location_optional_only_when_virtual() {
        let mut in_person = submission();
        in_person.location = None;
        assert!(in_person.validate(now()).is_err());

        let mut online = submission();
        online.location = Some("  ".to_string());
        online.is_virtual = true;
        let event = online.validate(now()).unwrap();
        assert!(event.location.is_none());
    }

    #[test]
    fn test_long_title_rejected() {
        let mut bad = submission();
        bad.title = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(bad.validate(now()).is_err());
    }

    #[test]
    fn test_empty_end_date_is_ignored() {
        let mut single_day = submission();
        single_day.end_date = Some(String::new());
        assert!(single_day.validate(now()).unwrap().end_date.is_none());
    }
}
