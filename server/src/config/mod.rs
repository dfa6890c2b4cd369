use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::services::personalize::cause_key;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_INDEX_NAME: &str = "opportunities";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Contentstack data centre; picks the API hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Us,
    Eu,
    AzureNa,
    AzureEu,
    GcpNa,
}

impl Region {
    pub fn delivery_host(self) -> &'static str {
        match self {
            Region::Us => "cdn.contentstack.io",
            Region::Eu => "eu-cdn.contentstack.com",
            Region::AzureNa => "azure-na-cdn.contentstack.com",
            Region::AzureEu => "azure-eu-cdn.contentstack.com",
            Region::GcpNa => "gcp-na-cdn.contentstack.com",
        }
    }

    pub fn management_host(self) -> &'static str {
        match self {
            Region::Us => "api.contentstack.io",
            Region::Eu => "eu-api.contentstack.com",
            Region::AzureNa => "azure-na-api.contentstack.com",
            Region::AzureEu => "azure-eu-api.contentstack.com",
            Region::GcpNa => "gcp-na-api.contentstack.com",
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "us" | "na" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "azure-na" | "azure_na" => Ok(Region::AzureNa),
            "azure-eu" | "azure_eu" => Ok(Region::AzureEu),
            "gcp-na" | "gcp_na" => Ok(Region::GcpNa),
            other => Err(format!("unknown region '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentstackConfig {
    pub api_key: String,
    pub delivery_token: String,
    pub environment: String,
    pub region: Region,
    pub management_token: Option<String>,
    /// Cause slug -> Personalize variant uid.
    pub variants: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AlgoliaConfig {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub registration: Option<String>,
    pub submission: Option<String>,
    pub approval: Option<String>,
    pub revalidation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub is_production: bool,
    pub contentstack: ContentstackConfig,
    pub algolia: Option<AlgoliaConfig>,
    pub webhooks: WebhookConfig,
    pub revalidate_secret: Option<String>,
    pub approval_secret: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                message: format!("{}", e),
            })?,
            None => DEFAULT_PORT,
        };

        let region = get("CONTENTSTACK_REGION")
            .map(|raw| raw.parse::<Region>())
            .transpose()
            .map_err(|message| ConfigError::Invalid {
                key: "CONTENTSTACK_REGION",
                message,
            })?
            .unwrap_or_default();

        let contentstack = ContentstackConfig {
            api_key: require("CONTENTSTACK_API_KEY")?,
            delivery_token: require("CONTENTSTACK_DELIVERY_TOKEN")?,
            environment: get("CONTENTSTACK_ENVIRONMENT")
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            region,
            management_token: get("CONTENTSTACK_MANAGEMENT_TOKEN"),
            variants: get("CONTENTSTACK_PERSONALIZE_VARIANTS")
                .map(|raw| parse_variant_map(&raw))
                .unwrap_or_default(),
        };

        let algolia = match (get("ALGOLIA_APP_ID"), get("ALGOLIA_ADMIN_KEY")) {
            (Some(app_id), Some(api_key)) => Some(AlgoliaConfig {
                app_id,
                api_key,
                index_name: get("ALGOLIA_INDEX_NAME")
                    .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            }),
            _ => None,
        };

        let webhooks = WebhookConfig {
            registration: get("AUTOMATE_REGISTRATION_WEBHOOK"),
            submission: get("AUTOMATE_SUBMISSION_WEBHOOK"),
            approval: get("AUTOMATE_APPROVAL_WEBHOOK"),
            revalidation: get("FRONTEND_REVALIDATE_URL"),
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            port,
            is_production: get("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            contentstack,
            algolia,
            webhooks,
            revalidate_secret: get("REVALIDATE_SECRET"),
            approval_secret: get("APPROVAL_SECRET"),
            cors_allowed_origins,
        })
    }

    /// Warns about optional integrations that are switched off.
    pub fn log_disabled_features(&self) {
        if self.contentstack.management_token.is_none() {
            tracing::warn!("CONTENTSTACK_MANAGEMENT_TOKEN not set, event submission disabled");
        }
        if self.algolia.is_none() {
            tracing::warn!("Algolia not configured, search falls back to Contentstack filtering");
        }
        for (name, url) in [
            ("registration", &self.webhooks.registration),
            ("submission", &self.webhooks.submission),
            ("approval", &self.webhooks.approval),
        ] {
            if url.is_none() {
                tracing::warn!(webhook = name, "Automate webhook not configured");
            }
        }
        if self.revalidate_secret.is_none() {
            tracing::warn!("REVALIDATE_SECRET not set, /api/revalidate and /api/algolia-sync reject all calls");
        }
    }
}

/// Parses `environment=0_1, education=0_2` into a cause -> variant map.
fn parse_variant_map(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (cause, variant) = pair.split_once('=')?;
            let cause = cause_key(cause);
            let variant = variant.trim();
            if cause.is_empty() || variant.is_empty() {
                tracing::warn!("Ignoring malformed personalize variant entry '{}'", pair);
                return None;
            }
            Some((cause, variant.to_string()))
        })
        .collect()
}
