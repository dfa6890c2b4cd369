pub mod cause;
pub mod created_event;
pub mod event;
pub mod location;
pub mod organizer;
pub mod registration;

pub use cause::Cause;
pub use created_event::{CreatedEvent, EventStatus};
pub use event::Opportunity;
pub use location::Location;
pub use organizer::Organizer;
pub use registration::Registration;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// CMS date fields arrive either as `2025-03-01` or as a full ISO timestamp.
pub fn parse_cms_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lowercase, hyphen-separated form of a title.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Picks an explicit slug, else the last segment of the entry URL, else the slugified title.
pub(crate) fn resolve_slug(slug: Option<&str>, url: Option<&str>, title: &str) -> String {
    let explicit = slug.map(str::trim).filter(|s| !s.is_empty());
    let from_url = url
        .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty());
    explicit
        .or(from_url)
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| slugify(title))
}
