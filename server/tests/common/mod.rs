#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use impactconnect_server::config::Config;
use impactconnect_server::routes::create_routes;
use impactconnect_server::services::algolia::{
    OpportunityRecord, SearchIndex, SearchRequest, SearchResponse,
};
use impactconnect_server::services::automate::{Notifier, WebhookKind};
use impactconnect_server::services::contentstack::{
    ContentManager, ContentSource, EntryPage, EntryQuery,
};
use impactconnect_server::state::AppState;
use impactconnect_server::utils::error::{UpstreamError, UpstreamErrorKind};

pub const REVALIDATE_SECRET: &str = "reval-secret";
pub const APPROVAL_SECRET: &str = "approve-secret";

pub fn day(offset: i64) -> String {
    (Utc::now().date_naive() + Duration::days(offset)).to_string()
}

pub fn opportunity_entry(
    uid: &str,
    title: &str,
    start_offset: i64,
    city: &str,
    cause: &str,
    is_virtual: bool,
) -> Value {
    json!({
        "uid": uid,
        "title": title,
        "url": format!("/opportunities/{}", uid),
        "description": format!("About {}", title),
        "start_date": day(start_offset),
        "is_virtual": is_virtual,
        "location": [{ "uid": format!("loc-{}", city), "title": city, "slug": city.to_lowercase(), "city": city }],
        "causes": [{ "uid": format!("cause-{}", cause), "title": cause, "slug": cause.to_lowercase() }],
        "organizer": [{ "uid": "org1", "title": "Helping Hands", "email": "hello@helpinghands.org" }]
    })
}

pub fn sample_catalog() -> HashMap<String, Vec<Value>> {
    let mut catalog = HashMap::new();
    catalog.insert(
        "opportunity".to_string(),
        vec![
            opportunity_entry("beach", "Beach Clean Up", 3, "Mumbai", "Environment", false),
            opportunity_entry("tutor", "Online Tutoring", 5, "Pune", "Education", true),
            opportunity_entry("trees", "Tree Planting", 1, "Mumbai", "Environment", false),
            opportunity_entry("old", "Winter Blanket Drive", -30, "Delhi", "Community", false),
        ],
    );
    catalog.insert(
        "cause".to_string(),
        vec![
            json!({ "uid": "c2", "title": "Environment", "color": "#22c55e" }),
            json!({ "uid": "c1", "title": "Education" }),
        ],
    );
    catalog.insert(
        "home_page".to_string(),
        vec![json!({ "uid": "home", "title": "Home", "hero": "Find your cause" })],
    );
    catalog
}

fn regex_literal(pattern: &str) -> String {
    pattern.replace('\\', "").to_lowercase()
}

/// Evaluates the handful of Contentstack query operators the service emits.
fn matches_query(entry: &Value, query: &Value) -> bool {
    let Some(clauses) = query.as_object() else {
        return true;
    };
    clauses.iter().all(|(key, expected)| match key.as_str() {
        "$or" => expected
            .as_array()
            .map(|alternatives| alternatives.iter().any(|alt| matches_query(entry, alt)))
            .unwrap_or(false),
        field => match expected.get("$regex").and_then(Value::as_str) {
            Some(pattern) => entry
                .get(field)
                .and_then(Value::as_str)
                .map(|v| v.to_lowercase().contains(&regex_literal(pattern)))
                .unwrap_or(false),
            None => entry.get(field) == Some(expected),
        },
    })
}

#[derive(Default)]
pub struct FakeContent {
    pub catalog: HashMap<String, Vec<Value>>,
    pub failure: Option<UpstreamErrorKind>,
    pub queries: Mutex<Vec<(String, EntryQuery)>>,
}

impl FakeContent {
    pub fn new(catalog: HashMap<String, Vec<Value>>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn failing(kind: UpstreamErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<(String, EntryQuery)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for FakeContent {
    async fn entries(&self, content_type: &str, query: &EntryQuery) -> Result<EntryPage, UpstreamError> {
        self.queries
            .lock()
            .unwrap()
            .push((content_type.to_string(), query.clone()));

        if let Some(kind) = self.failure {
            return Err(UpstreamError::new("Contentstack", kind, "fake failure"));
        }

        let matching: Vec<Value> = self
            .catalog
            .get(content_type)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| query.query.as_ref().map_or(true, |q| matches_query(entry, q)))
            .map(|mut entry| {
                if let (Some(variant), Some(fields)) = (&query.variant, entry.as_object_mut()) {
                    fields.insert("variant".to_string(), json!(variant));
                }
                entry
            })
            .collect();

        let count = matching.len() as u64;
        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.unwrap_or(100) as usize;
        Ok(EntryPage {
            entries: matching.into_iter().skip(skip).take(limit).collect(),
            count: Some(count),
        })
    }
}

#[derive(Default)]
pub struct FakeManager {
    pub created: Mutex<Vec<(String, Value)>>,
    pub updated: Mutex<Vec<(String, Value)>>,
    pub published: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentManager for FakeManager {
    async fn create_entry(&self, content_type: &str, entry: Value) -> Result<String, UpstreamError> {
        let mut created = self.created.lock().unwrap();
        created.push((content_type.to_string(), entry));
        Ok(format!("blt_new_{}", created.len()))
    }

    async fn fetch_entry(&self, _content_type: &str, uid: &str) -> Result<Value, UpstreamError> {
        if uid == "missing" {
            return Err(UpstreamError::new(
                "Contentstack",
                UpstreamErrorKind::NotFound,
                "no such entry",
            ));
        }
        Ok(json!({
            "uid": uid,
            "title": "Community Garden Day",
            "organizer_name": "Green Thumbs",
            "organizer_email": "garden@example.org",
            "approval_status": "pending"
        }))
    }

    async fn update_entry(&self, _content_type: &str, uid: &str, entry: Value) -> Result<(), UpstreamError> {
        self.updated.lock().unwrap().push((uid.to_string(), entry));
        Ok(())
    }

    async fn publish_entry(&self, _content_type: &str, uid: &str) -> Result<(), UpstreamError> {
        self.published.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIndex {
    pub saved: Mutex<Vec<OpportunityRecord>>,
    pub deleted: Mutex<Vec<String>>,
    pub replaced: Mutex<Option<usize>>,
    pub searches: Mutex<Vec<SearchRequest>>,
}

#[async_trait]
impl SearchIndex for FakeIndex {
    async fn save_object(&self, record: &OpportunityRecord) -> Result<(), UpstreamError> {
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn delete_object(&self, object_id: &str) -> Result<(), UpstreamError> {
        self.deleted.lock().unwrap().push(object_id.to_string());
        Ok(())
    }

    async fn replace_all(&self, records: &[OpportunityRecord]) -> Result<(), UpstreamError> {
        *self.replaced.lock().unwrap() = Some(records.len());
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, UpstreamError> {
        self.searches.lock().unwrap().push(request.clone());
        Ok(SearchResponse {
            hits: vec![],
            nb_hits: 30,
            page: request.page,
            nb_pages: 3,
        })
    }
}

/// Records notifications; `accept` decides what the "webhook" answers.
pub struct FakeNotifier {
    pub accept: bool,
    pub sent: Mutex<Vec<(WebhookKind, Value)>>,
}

impl FakeNotifier {
    pub fn accepting(accept: bool) -> Self {
        Self {
            accept,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(WebhookKind, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, kind: WebhookKind, payload: Value) -> bool {
        self.sent.lock().unwrap().push((kind, payload));
        self.accept
    }
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("CONTENTSTACK_API_KEY", "blt_test"),
        ("CONTENTSTACK_DELIVERY_TOKEN", "cs_test"),
        ("CONTENTSTACK_PERSONALIZE_VARIANTS", "environment=cs_var_env"),
        ("REVALIDATE_SECRET", REVALIDATE_SECRET),
        ("APPROVAL_SECRET", APPROVAL_SECRET),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

pub struct TestApp {
    pub router: Router,
    pub content: Arc<FakeContent>,
    pub manager: Option<Arc<FakeManager>>,
    pub index: Option<Arc<FakeIndex>>,
    pub notifier: Arc<FakeNotifier>,
}

pub struct TestAppBuilder {
    content: FakeContent,
    with_manager: bool,
    with_index: bool,
    notifier_accepts: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            content: FakeContent::new(sample_catalog()),
            with_manager: false,
            with_index: false,
            notifier_accepts: true,
        }
    }

    pub fn content(mut self, content: FakeContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_manager(mut self) -> Self {
        self.with_manager = true;
        self
    }

    pub fn with_index(mut self) -> Self {
        self.with_index = true;
        self
    }

    pub fn failing_webhooks(mut self) -> Self {
        self.notifier_accepts = false;
        self
    }

    pub fn build(self) -> TestApp {
        let content = Arc::new(self.content);
        let manager = self.with_manager.then(|| Arc::new(FakeManager::default()));
        let index = self.with_index.then(|| Arc::new(FakeIndex::default()));
        let notifier = Arc::new(FakeNotifier::accepting(self.notifier_accepts));

        let state = AppState::new(
            test_config(),
            content.clone(),
            manager.clone().map(|m| m as Arc<dyn ContentManager>),
            index.clone().map(|i| i as Arc<dyn SearchIndex>),
            notifier.clone(),
        );

        TestApp {
            router: create_routes(state),
            content,
            manager,
            index,
            notifier,
        }
    }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}
