//! Inbound Contentstack webhooks: cache revalidation and search index sync.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{resolve_slug, Opportunity};
use crate::services::algolia::{OpportunityRecord, SearchIndex};
use crate::services::automate::{Notifier, WebhookKind};
use crate::services::opportunities::OPPORTUNITY_CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::validation::{json_body, parse_flag, query_params, secrets_match};

#[derive(Debug, Default, Deserialize)]
pub struct WebhookParams {
    pub secret: Option<String>,
    /// `true` asks algolia-sync for a full reindex.
    pub full: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentTypeRef {
    #[serde(default)]
    pub uid: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub entry: Value,
    #[serde(default)]
    pub content_type: ContentTypeRef,
}

/// Contentstack webhook envelope (`event`: publish, unpublish, delete, ...).
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub data: WebhookData,
}

impl WebhookPayload {
    fn entry_str(&self, key: &str) -> Option<&str> {
        self.data.entry.get(key).and_then(Value::as_str)
    }
}

fn check_secret(state: &AppState, provided: Option<&str>) -> Result<(), AppError> {
    let expected = state.config.revalidate_secret.as_deref().ok_or_else(|| {
        AppError::NotConfigured("Webhook secret is not configured".to_string())
    })?;
    if !secrets_match(expected, provided.unwrap_or_default()) {
        return Err(AppError::AuthError("Invalid webhook secret".to_string()));
    }
    Ok(())
}

/// Site paths whose rendered output depends on an entry of `content_type`.
pub fn affected_paths(content_type: &str, slug: Option<&str>) -> Vec<String> {
    let mut paths: Vec<String> = match content_type {
        OPPORTUNITY_CONTENT_TYPE => vec!["/".into(), "/opportunities".into()],
        "cause" => vec!["/".into(), "/causes".into(), "/opportunities".into()],
        "location" | "organizer" => vec!["/opportunities".into()],
        "home_page" | "site_settings" => vec!["/".into()],
        "about_page" => vec!["/about".into()],
        "how_it_works_page" => vec!["/how-it-works".into()],
        "opportunities_page" => vec!["/opportunities".into()],
        "create_event_page" => vec!["/create-event".into()],
        "my_events_page" => vec!["/my-events".into()],
        "contact_page" => vec!["/contact".into()],
        "faq_page" => vec!["/faq".into()],
        "partners_page" => vec!["/partners".into()],
        "privacy_page" => vec!["/privacy".into()],
        "terms_page" => vec!["/terms".into()],
        _ => vec!["/".into()],
    };

    if let Some(slug) = slug.filter(|s| !s.is_empty()) {
        match content_type {
            OPPORTUNITY_CONTENT_TYPE => paths.push(format!("/opportunities/{}", slug)),
            "cause" => paths.push(format!("/causes/{}", slug)),
            _ => {}
        }
    }
    paths
}

#[derive(Debug, Serialize)]
pub struct RevalidationResult {
    pub content_type: String,
    pub paths: Vec<String>,
    pub forwarded: bool,
}

pub async fn revalidate(
    State(state): State<AppState>,
    params: Result<Query<WebhookParams>, QueryRejection>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let params = query_params(params)?;
    check_secret(&state, params.secret.as_deref())?;
    let payload = json_body(payload)?;

    let content_type = payload.data.content_type.uid.clone();
    let slug = payload.entry_str("title").map(|title| {
        resolve_slug(
            payload.entry_str("slug"),
            payload.entry_str("url"),
            title,
        )
    });
    let paths = affected_paths(&content_type, slug.as_deref());

    let forwarded = state
        .notifier
        .notify(WebhookKind::Revalidation, json!({ "paths": paths }))
        .await;

    tracing::info!(
        content_type = %content_type,
        event = %payload.event,
        paths = ?paths,
        "Revalidation requested"
    );

    Ok(success(
        RevalidationResult {
            content_type,
            paths,
            forwarded,
        },
        "Revalidation processed",
    ))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Upserted,
    Deleted,
    Reindexed,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub action: SyncAction,
    pub object_id: Option<String>,
    pub count: usize,
}

pub async fn algolia_sync(
    State(state): State<AppState>,
    params: Result<Query<WebhookParams>, QueryRejection>,
    payload: Option<Json<WebhookPayload>>,
) -> Result<Response, AppError> {
    let params = query_params(params)?;
    check_secret(&state, params.secret.as_deref())?;
    let full = parse_flag("full", params.full.as_deref())?.unwrap_or(false);
    let index = state
        .search
        .clone()
        .ok_or_else(|| AppError::NotConfigured("Search index is not configured".to_string()))?;

    if full {
        let records: Vec<OpportunityRecord> = state
            .opportunities
            .all()
            .await?
            .iter()
            .map(OpportunityRecord::from)
            .collect();
        index.replace_all(&records).await?;
        return Ok(success(
            SyncResult {
                action: SyncAction::Reindexed,
                object_id: None,
                count: records.len(),
            },
            "Search index rebuilt",
        ));
    }

    let Json(payload) = payload.ok_or_else(|| {
        AppError::ValidationError("Webhook payload is required".to_string())
    })?;
    let skipped = |object_id: Option<String>| SyncResult {
        action: SyncAction::Skipped,
        object_id,
        count: 0,
    };

    if payload.data.content_type.uid != OPPORTUNITY_CONTENT_TYPE {
        tracing::debug!(content_type = %payload.data.content_type.uid, "Ignoring non-opportunity entry");
        return Ok(success(skipped(None), "Nothing to sync"));
    }
    let object_id = payload
        .entry_str("uid")
        .map(str::to_string)
        .ok_or_else(|| AppError::ValidationError("Webhook entry has no uid".to_string()))?;

    let result = match payload.event.as_str() {
        "publish" | "create" | "update" => {
            // Delivery API resolves references; fall back to the raw webhook entry.
            let opportunity = match state.opportunities.by_uid(&object_id).await? {
                Some(found) => found,
                None => Opportunity::from_entry(payload.data.entry.clone()).map_err(|e| {
                    AppError::ValidationError(format!("Unusable opportunity entry: {}", e))
                })?,
            };
            index.save_object(&OpportunityRecord::from(&opportunity)).await?;
            SyncResult {
                action: SyncAction::Upserted,
                object_id: Some(object_id),
                count: 1,
            }
        }
        "unpublish" | "delete" => {
            index.delete_object(&object_id).await?;
            SyncResult {
                action: SyncAction::Deleted,
                object_id: Some(object_id),
                count: 1,
            }
        }
        other => {
            tracing::debug!(event = other, module = %payload.module, "Ignoring webhook event");
            skipped(Some(object_id))
        }
    };

    Ok(success(result, "Search index synced"))
}
