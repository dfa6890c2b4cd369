use std::sync::Arc;

use crate::config::Config;
use crate::services::algolia::{AlgoliaClient, SearchIndex};
use crate::services::automate::{AutomateNotifier, Notifier};
use crate::services::contentstack::{ContentManager, ContentSource, DeliveryClient, ManagementClient};
use crate::services::opportunities::OpportunityService;
use crate::utils::error::UpstreamError;

/// Shared, read-only handles for every request. Holds no per-user data.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: Arc<dyn ContentSource>,
    pub opportunities: OpportunityService,
    pub manager: Option<Arc<dyn ContentManager>>,
    pub search: Option<Arc<dyn SearchIndex>>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        content: Arc<dyn ContentSource>,
        manager: Option<Arc<dyn ContentManager>>,
        search: Option<Arc<dyn SearchIndex>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            opportunities: OpportunityService::new(content.clone()),
            content,
            manager,
            search,
            notifier,
        }
    }

    pub fn from_config(config: Config) -> Result<Self, UpstreamError> {
        let content: Arc<dyn ContentSource> = Arc::new(DeliveryClient::new(&config.contentstack)?);
        let manager = ManagementClient::from_config(&config.contentstack)?
            .map(|client| Arc::new(client) as Arc<dyn ContentManager>);
        let search = config
            .algolia
            .as_ref()
            .map(AlgoliaClient::new)
            .transpose()?
            .map(|client| Arc::new(client) as Arc<dyn SearchIndex>);
        let notifier = Arc::new(AutomateNotifier::new(config.webhooks.clone()));

        Ok(Self::new(config, content, manager, search, notifier))
    }
}
