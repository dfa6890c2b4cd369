use axum::extract::{Path, State};
use axum::response::Response;

use crate::services::contentstack::ContentSource;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// Singleton page content types the site reads directly.
pub const PAGE_CONTENT_TYPES: [&str; 12] = [
    "home_page",
    "about_page",
    "how_it_works_page",
    "opportunities_page",
    "create_event_page",
    "my_events_page",
    "contact_page",
    "faq_page",
    "partners_page",
    "privacy_page",
    "terms_page",
    "site_settings",
];

pub fn is_page_content_type(content_type: &str) -> bool {
    PAGE_CONTENT_TYPES.contains(&content_type)
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
) -> Result<Response, AppError> {
    if !is_page_content_type(&content_type) {
        return Err(AppError::NotFound(format!(
            "Unknown page type '{}'",
            content_type
        )));
    }

    let entry = state
        .content
        .single_entry(&content_type, None)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No published '{}' entry", content_type)))?;

    Ok(success(entry, "Page retrieved"))
}
