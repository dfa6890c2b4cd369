//! Visitor state that lives in browser storage: registrations and
//! self-submitted events, each kept as one JSON array under a fixed key.

pub mod backend;

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::{CreatedEvent, EventStatus, Registration};

pub use backend::{FileStorage, MemoryStorage, StorageBackend};

pub const REGISTRATIONS_KEY: &str = "impactconnect_registrations";
pub const CREATED_EVENTS_KEY: &str = "impactconnect_created_events";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct ClientStore<B> {
    backend: B,
}

impl<B: StorageBackend> ClientStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable stored list");
                Ok(Vec::new())
            }
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        if items.is_empty() {
            self.backend.remove_item(key)?;
        } else {
            self.backend.set_item(key, &serde_json::to_string(items)?)?;
        }
        Ok(())
    }

    pub fn registrations(&self) -> Result<Vec<Registration>, StoreError> {
        self.read_list(REGISTRATIONS_KEY)
    }

    /// Re-registering for the same opportunity replaces the earlier entry.
    pub fn add_registration(&self, registration: Registration) -> Result<(), StoreError> {
        let mut registrations = self.registrations()?;
        registrations.retain(|r| r.opportunity_uid != registration.opportunity_uid);
        registrations.push(registration);
        self.write_list(REGISTRATIONS_KEY, &registrations)
    }

    /// Returns whether a registration was removed.
    pub fn remove_registration(&self, opportunity_uid: &str) -> Result<bool, StoreError> {
        let mut registrations = self.registrations()?;
        let before = registrations.len();
        registrations.retain(|r| r.opportunity_uid != opportunity_uid);
        if registrations.len() == before {
            return Ok(false);
        }
        self.write_list(REGISTRATIONS_KEY, &registrations)?;
        Ok(true)
    }

    pub fn is_registered(&self, opportunity_uid: &str) -> Result<bool, StoreError> {
        Ok(self
            .registrations()?
            .iter()
            .any(|r| r.opportunity_uid == opportunity_uid))
    }

    pub fn created_events(&self) -> Result<Vec<CreatedEvent>, StoreError> {
        self.read_list(CREATED_EVENTS_KEY)
    }

    pub fn add_created_event(&self, event: CreatedEvent) -> Result<(), StoreError> {
        let mut events = self.created_events()?;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => events.push(event),
        }
        self.write_list(CREATED_EVENTS_KEY, &events)
    }

    /// Returns whether an event with `id` exists.
    pub fn set_created_event_status(&self, id: Uuid, status: EventStatus) -> Result<bool, StoreError> {
        let mut events = self.created_events()?;
        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        event.status = status;
        self.write_list(CREATED_EVENTS_KEY, &events)?;
        Ok(true)
    }
}
