use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::cause::CauseEntry;
use super::location::LocationEntry;
use super::{null_as_default, parse_cms_date, resolve_slug, Cause, Location, Organizer};

/// A volunteer event as published in the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub uid: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_virtual: bool,
    pub location: Option<Location>,
    pub causes: Vec<Cause>,
    pub organizer: Option<Organizer>,
    pub spots_available: Option<u32>,
    pub time_commitment: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ImageField {
    url: Option<String>,
}

/// Raw delivery API shape. Reference fields are always arrays.
#[derive(Debug, Deserialize)]
struct OpportunityEntry {
    uid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    slug: Option<String>,
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    is_virtual: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    location: Vec<LocationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    causes: Vec<CauseEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    organizer: Vec<serde_json::Value>,
    spots_available: Option<u32>,
    time_commitment: Option<String>,
    image: Option<ImageField>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("entry {0} has no usable start_date")]
    MissingStartDate(String),
}

impl Opportunity {
    pub fn from_entry(entry: serde_json::Value) -> Result<Self, EntryError> {
        let raw: OpportunityEntry = serde_json::from_value(entry)?;

        let start_date = raw
            .start_date
            .as_deref()
            .and_then(parse_cms_date)
            .ok_or_else(|| EntryError::MissingStartDate(raw.uid.clone()))?;

        let organizer = raw
            .organizer
            .into_iter()
            .next()
            .map(Organizer::from_entry)
            .transpose()?;

        Ok(Self {
            slug: resolve_slug(raw.slug.as_deref(), raw.url.as_deref(), &raw.title),
            uid: raw.uid,
            title: raw.title,
            description: raw.description.unwrap_or_default(),
            start_date,
            end_date: raw.end_date.as_deref().and_then(parse_cms_date),
            is_virtual: raw.is_virtual.unwrap_or(false),
            location: raw.location.into_iter().next().map(Location::from),
            causes: raw.causes.into_iter().map(Cause::from).collect(),
            organizer,
            spots_available: raw.spots_available,
            time_commitment: raw.time_commitment,
            image_url: raw.image.and_then(|i| i.url),
            created_at: raw.created_at,
        })
    }

    /// Last day of the event; single-day events end when they start.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date
            .filter(|end| *end >= self.start_date)
            .unwrap_or(self.start_date)
    }

    pub fn has_cause(&self, slug: &str) -> bool {
        self.causes.iter().any(|c| c.slug.eq_ignore_ascii_case(slug))
    }

    pub fn cause_slugs(&self) -> Vec<String> {
        self.causes.iter().map(|c| c.slug.clone()).collect()
    }
}
