use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use reqwest::{Client, RequestBuilder};
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::AlgoliaConfig;
use crate::models::Opportunity;
use crate::utils::error::{UpstreamError, UpstreamErrorKind};

const SERVICE: &str = "Algolia";
const DESCRIPTION_LIMIT: usize = 500;
const BATCH_SIZE: usize = 1000;

/// Flattened opportunity stored in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    #[serde(default)]
    pub start_timestamp: i64,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub causes: Vec<String>,
    pub organizer: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Opportunity> for OpportunityRecord {
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            object_id: opportunity.uid.clone(),
            title: opportunity.title.clone(),
            slug: opportunity.slug.clone(),
            description: truncate_chars(&strip_tags(&opportunity.description), DESCRIPTION_LIMIT),
            start_date: opportunity.start_date.to_string(),
            start_timestamp: opportunity
                .start_date
                .and_time(NaiveTime::MIN)
                .and_utc()
                .timestamp(),
            end_date: opportunity.end_date.map(|d| d.to_string()),
            location: opportunity.location.as_ref().map(|l| l.name.clone()),
            city: opportunity.location.as_ref().map(|l| l.city_key()),
            is_virtual: opportunity.is_virtual,
            causes: opportunity.cause_slugs(),
            organizer: opportunity.organizer.as_ref().map(|o| o.name.clone()),
            image_url: opportunity.image_url.clone(),
        }
    }
}

/// Plain text of a rich-text field, entities decoded and whitespace collapsed.
fn strip_tags(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    /// Zero-based, as Algolia counts pages.
    pub page: u32,
    pub hits_per_page: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<OpportunityRecord>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub nb_pages: u32,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn save_object(&self, record: &OpportunityRecord) -> Result<(), UpstreamError>;

    async fn delete_object(&self, object_id: &str) -> Result<(), UpstreamError>;

    /// Swaps the index contents for `records`. The live index keeps serving
    /// its old contents if any write fails.
    async fn replace_all(&self, records: &[OpportunityRecord]) -> Result<(), UpstreamError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, UpstreamError>;
}

const TASK_POLL_INTERVAL: Duration = Duration::from_millis(200);
const TASK_POLL_ATTEMPTS: u32 = 150;

#[derive(Debug, Deserialize)]
struct TaskAck {
    #[serde(rename = "taskID")]
    task_id: i64,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
}

pub struct AlgoliaClient {
    client: Client,
    /// `https://{app}.algolia.net/1/indexes`
    write_base: String,
    /// `https://{app}-dsn.algolia.net/1/indexes`
    search_base: String,
    index_name: String,
    app_id: String,
    api_key: String,
}

impl AlgoliaClient {
    pub fn new(config: &AlgoliaConfig) -> Result<Self, UpstreamError> {
        Self::with_hosts(
            config,
            format!("https://{}.algolia.net", config.app_id),
            format!("https://{}-dsn.algolia.net", config.app_id),
        )
    }

    fn with_hosts(
        config: &AlgoliaConfig,
        write_host: String,
        search_host: String,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UpstreamError::network(SERVICE, e))?;

        Ok(Self {
            client,
            write_base: format!("{}/1/indexes", write_host),
            search_base: format!("{}/1/indexes", search_host),
            index_name: config.index_name.clone(),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.write_base, index)
    }

    fn temp_index(&self) -> String {
        format!("{}_tmp", self.index_name)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .authorized(request)
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

    async fn send_task(&self, request: RequestBuilder) -> Result<i64, UpstreamError> {
        let ack: TaskAck = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e))?;
        Ok(ack.task_id)
    }

    /// Polls until Algolia reports the task on `index` as published.
    async fn wait_task(&self, index: &str, task_id: i64) -> Result<(), UpstreamError> {
        let url = format!("{}/task/{}", self.index_url(index), task_id);
        for _ in 0..TASK_POLL_ATTEMPTS {
            let task: TaskStatus = self
                .send(self.client.get(&url))
                .await?
                .json()
                .await
                .map_err(|e| UpstreamError::decode(SERVICE, e))?;
            if task.status == "published" {
                return Ok(());
            }
            tokio::time::sleep(TASK_POLL_INTERVAL).await;
        }
        Err(UpstreamError::new(
            SERVICE,
            UpstreamErrorKind::ServerError,
            format!("task {} on {} did not finish", task_id, index),
        ))
    }

    /// Copies settings to the temp index, fills it, then moves it over the
    /// live index.
    async fn rebuild_into(
        &self,
        temp: &str,
        records: &[OpportunityRecord],
    ) -> Result<(), UpstreamError> {
        let copy = self
            .send_task(
                self.client
                    .post(format!("{}/operation", self.index_url(&self.index_name)))
                    .json(&json!({
                        "operation": "copy",
                        "destination": temp,
                        "scope": ["settings", "synonyms", "rules"]
                    })),
            )
            .await;
        match copy {
            Ok(task_id) => self.wait_task(temp, task_id).await?,
            // first build: no live index to take settings from
            Err(e) if e.kind == UpstreamErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        for chunk in records.chunks(BATCH_SIZE) {
            let requests: Vec<_> = chunk
                .iter()
                .map(|record| json!({ "action": "addObject", "body": record }))
                .collect();
            let task_id = self
                .send_task(
                    self.client
                        .post(format!("{}/batch", self.index_url(temp)))
                        .json(&json!({ "requests": requests })),
                )
                .await?;
            self.wait_task(temp, task_id).await?;
        }

        let task_id = self
            .send_task(
                self.client
                    .post(format!("{}/operation", self.index_url(temp)))
                    .json(&json!({ "operation": "move", "destination": self.index_name })),
            )
            .await?;
        self.wait_task(temp, task_id).await
    }
}

#[async_trait]
impl SearchIndex for AlgoliaClient {
    async fn save_object(&self, record: &OpportunityRecord) -> Result<(), UpstreamError> {
        let url = format!("{}/{}", self.index_url(&self.index_name), record.object_id);
        self.send(self.client.put(url).json(record)).await?;
        info!(object_id = %record.object_id, "Saved opportunity to Algolia");
        Ok(())
    }

    async fn delete_object(&self, object_id: &str) -> Result<(), UpstreamError> {
        let url = format!("{}/{}", self.index_url(&self.index_name), object_id);
        self.send(self.client.delete(url)).await?;
        info!(object_id, "Deleted opportunity from Algolia");
        Ok(())
    }

    async fn replace_all(&self, records: &[OpportunityRecord]) -> Result<(), UpstreamError> {
        let temp = self.temp_index();
        if let Err(e) = self.rebuild_into(&temp, records).await {
            if let Err(cleanup) = self.send(self.client.delete(self.index_url(&temp))).await {
                warn!(index = %temp, error = %cleanup, "Failed to drop temporary index");
            }
            return Err(e);
        }

        info!(count = records.len(), "Reindexed opportunities in Algolia");
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, UpstreamError> {
        let url = format!("{}/{}/query", self.search_base, self.index_name);
        self.send(self.client.post(url).json(request))
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e))
    }
}
