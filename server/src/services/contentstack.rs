//! Contentstack Delivery and Management API clients.
//!
//! Handlers only see the [`ContentSource`] and [`ContentManager`] traits so
//! tests can swap in fixtures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ContentstackConfig;
use crate::utils::error::UpstreamError;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};

const SERVICE: &str = "Contentstack";
const VARIANT_HEADER: &str = "x-cs-variant-uid";
const DEFAULT_LOCALE: &str = "en-us";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Query parameters for listing entries of one content type.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    /// Contentstack JSON query (`{"is_virtual": true}` etc).
    pub query: Option<Value>,
    pub include: Vec<&'static str>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub include_count: bool,
    /// Personalize variant uid, sent as a header.
    pub variant: Option<String>,
}

impl EntryQuery {
    fn to_params(&self, environment: &str) -> Vec<(String, String)> {
        let mut params = vec![("environment".to_string(), environment.to_string())];
        if let Some(query) = &self.query {
            params.push(("query".to_string(), query.to_string()));
        }
        for reference in &self.include {
            params.push(("include[]".to_string(), reference.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip".to_string(), skip.to_string()));
        }
        if self.include_count {
            params.push(("include_count".to_string(), "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPage {
    #[serde(default)]
    pub entries: Vec<Value>,
    pub count: Option<u64>,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn entries(&self, content_type: &str, query: &EntryQuery) -> Result<EntryPage, UpstreamError>;

    /// First entry of a singleton content type (home page, about page, ...).
    async fn single_entry(
        &self,
        content_type: &str,
        variant: Option<&str>,
    ) -> Result<Option<Value>, UpstreamError> {
        let query = EntryQuery {
            limit: Some(1),
            variant: variant.map(str::to_string),
            ..EntryQuery::default()
        };
        let page = self.entries(content_type, &query).await?;
        Ok(page.entries.into_iter().next())
    }
}

#[async_trait]
pub trait ContentManager: Send + Sync {
    /// Creates an unpublished entry and returns its uid.
    async fn create_entry(&self, content_type: &str, entry: Value) -> Result<String, UpstreamError>;

    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Value, UpstreamError>;

    async fn update_entry(&self, content_type: &str, uid: &str, entry: Value) -> Result<(), UpstreamError>;

    async fn publish_entry(&self, content_type: &str, uid: &str) -> Result<(), UpstreamError>;
}

fn build_http_client() -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| UpstreamError::network(SERVICE, e))
}

async fn send(request: RequestBuilder) -> Result<Response, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamError::network(SERVICE, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::from_status(SERVICE, status, body));
    }

    Ok(response)
}

async fn send_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> Result<T, UpstreamError> {
    send(request)
        .await?
        .json()
        .await
        .map_err(|e| UpstreamError::decode(SERVICE, e))
}

pub struct DeliveryClient {
    client: Client,
    base_url: String,
    api_key: String,
    delivery_token: String,
    environment: String,
    retry: RetryPolicy,
}

impl DeliveryClient {
    pub fn new(config: &ContentstackConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: format!("https://{}/v3", config.region.delivery_host()),
            api_key: config.api_key.clone(),
            delivery_token: config.delivery_token.clone(),
            environment: config.environment.clone(),
            retry: RetryPolicy::default(),
        })
    }

    fn request(&self, content_type: &str, query: &EntryQuery) -> RequestBuilder {
        let url = format!("{}/content_types/{}/entries", self.base_url, content_type);
        let mut request = self
            .client
            .get(url)
            .header("api_key", &self.api_key)
            .header("access_token", &self.delivery_token)
            .query(&query.to_params(&self.environment));

        if let Some(variant) = &query.variant {
            request = request.header(VARIANT_HEADER, variant);
        }
        request
    }
}

#[async_trait]
impl ContentSource for DeliveryClient {
    async fn entries(&self, content_type: &str, query: &EntryQuery) -> Result<EntryPage, UpstreamError> {
        debug!(content_type, query = ?query.query, "Fetching Contentstack entries");
        retry_with_backoff(&self.retry, || send_json(self.request(content_type, query))).await
    }
}

pub struct ManagementClient {
    client: Client,
    base_url: String,
    api_key: String,
    management_token: String,
    environment: String,
}

#[derive(Deserialize)]
struct EntryEnvelope {
    entry: Value,
}

impl ManagementClient {
    /// `None` when no management token is configured.
    pub fn from_config(config: &ContentstackConfig) -> Result<Option<Self>, UpstreamError> {
        let Some(token) = config.management_token.clone() else {
            return Ok(None);
        };

        Ok(Some(Self {
            client: build_http_client()?,
            base_url: format!("https://{}/v3", config.region.management_host()),
            api_key: config.api_key.clone(),
            management_token: token,
            environment: config.environment.clone(),
        }))
    }

    fn entries_url(&self, content_type: &str) -> String {
        format!("{}/content_types/{}/entries", self.base_url, content_type)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("api_key", &self.api_key)
            .header("authorization", &self.management_token)
    }
}

#[async_trait]
impl ContentManager for ManagementClient {
    async fn create_entry(&self, content_type: &str, entry: Value) -> Result<String, UpstreamError> {
        let request = self
            .authorized(self.client.post(self.entries_url(content_type)))
            .query(&[("locale", DEFAULT_LOCALE)])
            .json(&json!({ "entry": entry }));

        let created: EntryEnvelope = send_json(request).await?;
        created
            .entry
            .get("uid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UpstreamError::decode(SERVICE, "created entry has no uid"))
    }

    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.entries_url(content_type), uid);
        let fetched: EntryEnvelope = send_json(self.authorized(self.client.get(url))).await?;
        Ok(fetched.entry)
    }

    async fn update_entry(&self, content_type: &str, uid: &str, entry: Value) -> Result<(), UpstreamError> {
        let url = format!("{}/{}", self.entries_url(content_type), uid);
        let request = self
            .authorized(self.client.put(url))
            .json(&json!({ "entry": entry }));
        send(request).await.map(|_| ())
    }

    async fn publish_entry(&self, content_type: &str, uid: &str) -> Result<(), UpstreamError> {
        let url = format!("{}/{}/publish", self.entries_url(content_type), uid);
        let request = self.authorized(self.client.post(url)).json(&json!({
            "entry": {
                "environments": [self.environment],
                "locales": [DEFAULT_LOCALE],
            }
        }));
        send(request).await.map(|_| ())
    }
}
