use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organizer {
    pub uid: String,
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// Organizer content type. Entries always carry `title`; some stacks add
/// their own `name` and `contact_email` fields alongside it.
#[derive(Debug, Deserialize)]
struct OrganizerEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    uid: String,
    title: Option<String>,
    name: Option<String>,
    email: Option<String>,
    contact_email: Option<String>,
    website: Option<String>,
}

fn first_present(values: [Option<String>; 2]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl From<OrganizerEntry> for Organizer {
    fn from(entry: OrganizerEntry) -> Self {
        Self {
            uid: entry.uid,
            name: first_present([entry.title, entry.name]).unwrap_or_default(),
            email: first_present([entry.email, entry.contact_email]),
            website: entry.website,
        }
    }
}

impl Organizer {
    pub fn from_entry(entry: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<OrganizerEntry>(entry).map(Into::into)
    }
}
