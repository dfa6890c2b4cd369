use serde::{Deserialize, Serialize};

use super::{null_as_default, resolve_slug};
use crate::services::query_parser::city_facet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub uid: String,
    pub name: String,
    pub slug: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    uid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    name: Option<String>,
    slug: Option<String>,
    url: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

impl From<LocationEntry> for Location {
    fn from(entry: LocationEntry) -> Self {
        let name = match entry.name.filter(|n| !n.trim().is_empty()) {
            Some(name) if entry.title.trim().is_empty() => name,
            _ => entry.title,
        };
        Self {
            slug: resolve_slug(entry.slug.as_deref(), entry.url.as_deref(), &name),
            uid: entry.uid,
            name,
            city: entry.city,
            state: entry.state,
        }
    }
}

impl Location {
    pub fn from_entry(entry: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<LocationEntry>(entry).map(Into::into)
    }

    /// City used for search facets: the canonical name for known cities and
    /// their aliases, otherwise lowercased. Falls back to the location name.
    pub fn city_key(&self) -> String {
        city_facet(
            self.city
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(&self.name),
        )
    }
}
