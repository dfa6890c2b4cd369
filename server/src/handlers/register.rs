use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::models::Registration;
use crate::services::automate::{Notifier, WebhookKind};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::created;
use crate::utils::validation::{json_body, require_email, require_non_empty};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub opportunity_uid: String,
    #[serde(default)]
    pub opportunity_title: String,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
}

impl RegistrationRequest {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Registration, AppError> {
        Ok(Registration {
            opportunity_uid: require_non_empty("opportunityUid", &self.opportunity_uid)?,
            opportunity_title: self.opportunity_title.trim().to_string(),
            causes: self
                .causes
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            name: require_non_empty("name", &self.name)?,
            email: require_email("email", &self.email)?,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            registered_at: now,
        })
    }
}

/// Validates a sign-up and notifies Automate. The browser keeps the returned
/// record; a failed notification still counts as a successful registration.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let mut registration = json_body(payload)?.validate(Utc::now())?;

    let opportunity = match state
        .opportunities
        .by_uid(&registration.opportunity_uid)
        .await
    {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(
                opportunity_uid = %registration.opportunity_uid,
                error = %e,
                "Could not load opportunity details for registration email"
            );
            None
        }
    };

    if let Some(opportunity) = &opportunity {
        if registration.opportunity_title.is_empty() {
            registration.opportunity_title = opportunity.title.clone();
        }
        if registration.causes.is_empty() {
            registration.causes = opportunity.cause_slugs();
        }
    }

    let notified = state
        .notifier
        .notify(
            WebhookKind::Registration,
            json!({
                "type": "registration",
                "name": registration.name,
                "email": registration.email,
                "phone": registration.phone,
                "registeredAt": registration.registered_at,
                "opportunity": {
                    "uid": registration.opportunity_uid,
                    "title": registration.opportunity_title,
                    "startDate": opportunity.as_ref().map(|o| o.start_date),
                    "location": opportunity
                        .as_ref()
                        .and_then(|o| o.location.as_ref())
                        .map(|l| l.name.clone()),
                    "isVirtual": opportunity.as_ref().map(|o| o.is_virtual),
                },
            }),
        )
        .await;

    tracing::info!(
        opportunity_uid = %registration.opportunity_uid,
        notified,
        "Registration accepted"
    );

    Ok(created(registration, "Registration successful"))
}
