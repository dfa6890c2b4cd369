use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }
}

/// A community-submitted event awaiting (or past) moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub causes: Vec<String>,
    pub organizer_name: String,
    pub organizer_email: String,
    #[serde(default)]
    pub status: EventStatus,
    pub entry_uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CreatedEvent {
    /// Field layout of the `opportunity` content type for a pending submission.
    pub fn to_cms_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "start_date": self.start_date.to_string(),
            "end_date": self.end_date.map(|d| d.to_string()),
            "is_virtual": self.is_virtual,
            "venue": self.location,
            "cause_tags": self.causes,
            "organizer_name": self.organizer_name,
            "organizer_email": self.organizer_email,
            "submission_id": self.id.to_string(),
            "approval_status": self.status.as_str(),
        })
    }
}
