use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handlers::content::is_page_content_type;
use crate::models::Registration;
use crate::services::contentstack::ContentSource;
use crate::services::personalize::{personalize, PersonalizationContext};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::validation::json_body;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalizeRequest {
    /// The visitor's stored registrations, as kept in browser storage.
    pub registrations: Vec<Registration>,
    /// Singleton page to fetch in the matching variant.
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonalizedContent {
    #[serde(flatten)]
    pub context: PersonalizationContext,
    pub content: Option<Value>,
}

pub async fn personalize_content(
    State(state): State<AppState>,
    payload: Result<Json<PersonalizeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(payload)?;
    let context = personalize(&request.registrations, &state.config.contentstack.variants);

    let content = match request.content_type.as_deref() {
        None => None,
        Some(content_type) if !is_page_content_type(content_type) => {
            return Err(AppError::ValidationError(format!(
                "Unknown page type '{}'",
                content_type
            )));
        }
        Some(content_type) => {
            let variant = context.variant.as_deref();
            match state.content.single_entry(content_type, variant).await {
                Ok(entry) => entry,
                // A missing variant should not blank the page; serve the base entry.
                Err(e) if variant.is_some() => {
                    tracing::warn!(
                        content_type,
                        variant = ?variant,
                        error = %e,
                        "Variant fetch failed, using base entry"
                    );
                    state.content.single_entry(content_type, None).await?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    tracing::debug!(cause = ?context.cause, variant = ?context.variant, "Personalized");

    Ok(success(
        PersonalizedContent { context, content },
        "Personalization resolved",
    ))
}
