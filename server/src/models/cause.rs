use serde::{Deserialize, Serialize};

use super::{null_as_default, resolve_slug};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cause {
    pub uid: String,
    pub title: String,
    pub slug: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CauseEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    uid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    slug: Option<String>,
    url: Option<String>,
    color: Option<String>,
}

impl From<CauseEntry> for Cause {
    fn from(entry: CauseEntry) -> Self {
        Self {
            slug: resolve_slug(entry.slug.as_deref(), entry.url.as_deref(), &entry.title),
            uid: entry.uid,
            title: entry.title,
            color: entry.color.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl Cause {
    pub fn from_entry(entry: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<CauseEntry>(entry).map(Into::into)
    }
}
