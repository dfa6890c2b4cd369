use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sign-up kept in the visitor's browser storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub opportunity_uid: String,
    #[serde(default)]
    pub opportunity_title: String,
    /// Cause slugs of the opportunity, primary cause first.
    #[serde(default)]
    pub causes: Vec<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn primary_cause(&self) -> Option<&str> {
        self.causes
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty())
    }
}
