use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::entities::Entity;
use crate::error::{DeskError, DeskResult};

/// CRUD over one entity family. Mock and real backends are interchangeable.
pub trait Repository<T: Entity> {
    fn list(&self) -> DeskResult<Vec<T>>;
    fn get(&self, id: &str) -> DeskResult<T>;
    fn create(&mut self, item: T) -> DeskResult<T>;
    fn update(&mut self, id: &str, patch: &Value) -> DeskResult<T>;
    fn delete(&mut self, id: &str) -> DeskResult<()>;
}

fn not_found<T: Entity>(id: &str) -> DeskError {
    DeskError::NotFound {
        entity: T::KIND.resource().to_string(),
        id: id.to_string(),
    }
}

/// Merges a JSON object into any serializable record. `id` is never changed
/// and unknown fields are rejected.
pub fn apply_json_patch<T>(item: &T, patch: &Value) -> DeskResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let Some(fields) = patch.as_object() else {
        return Err(DeskError::invalid_input("patch", "must be an object"));
    };
    let mut doc = serde_json::to_value(item).map_err(anyhow::Error::from)?;
    let Some(obj) = doc.as_object_mut() else {
        return Err(DeskError::invalid_input("patch", "record is not an object"));
    };
    for (k, v) in fields {
        if k == "id" {
            continue;
        }
        // Unset optional fields serialize as null, so every known field is
        // already a key here.
        if !obj.contains_key(k) {
            return Err(DeskError::invalid_input(k.as_str(), "unknown field"));
        }
        obj.insert(k.clone(), v.clone());
    }
    serde_json::from_value(doc).map_err(|e| DeskError::invalid_input("patch", e.to_string()))
}

pub fn apply_patch<T: Entity>(item: &T, patch: &Value) -> DeskResult<T> {
    let updated = apply_json_patch(item, patch)?;
    updated.validate()?;
    Ok(updated)
}

/// In-memory repository seeded from fixtures.
pub struct MemoryRepository<T> {
    items: Vec<T>,
    latency: Duration,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            latency: Duration::ZERO,
        }
    }

    /// Sleeps before each read to mimic a network round-trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }

    fn position(&self, id: &str) -> DeskResult<usize> {
        self.items
            .iter()
            .position(|it| it.id() == id)
            .ok_or_else(|| not_found::<T>(id))
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn list(&self) -> DeskResult<Vec<T>> {
        self.simulate_latency();
        Ok(self.items.clone())
    }

    fn get(&self, id: &str) -> DeskResult<T> {
        self.simulate_latency();
        let idx = self.position(id)?;
        Ok(self.items[idx].clone())
    }

    fn create(&mut self, mut item: T) -> DeskResult<T> {
        item.validate()?;
        if item.id().trim().is_empty() {
            item.set_id(Uuid::new_v4().to_string());
        } else if self.items.iter().any(|it| it.id() == item.id()) {
            return Err(DeskError::invalid_input("id", "already exists"));
        }
        debug!(entity = T::KIND.resource(), id = item.id(), "created mock record");
        self.items.push(item.clone());
        Ok(item)
    }

    fn update(&mut self, id: &str, patch: &Value) -> DeskResult<T> {
        let idx = self.position(id)?;
        let updated = apply_patch(&self.items[idx], patch)?;
        self.items[idx] = updated.clone();
        Ok(updated)
    }

    fn delete(&mut self, id: &str) -> DeskResult<()> {
        let idx = self.position(id)?;
        self.items.remove(idx);
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

/// Repository backed by `{base}/{resource}` on the real backend.
pub struct RemoteRepository<'a, T> {
    client: &'a ApiClient,
    _entity: PhantomData<T>,
}

impl<'a, T: Entity> RemoteRepository<'a, T> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    fn item_path(id: &str) -> String {
        format!("{}/{}", T::KIND.resource(), id)
    }

    fn map_missing(e: DeskError, id: &str) -> DeskError {
        match e {
            DeskError::NotFound { .. } => not_found::<T>(id),
            other => other,
        }
    }
}

impl<T: Entity> Repository<T> for RemoteRepository<'_, T> {
    fn list(&self) -> DeskResult<Vec<T>> {
        let body: ListBody<T> = self.client.get(T::KIND.resource())?;
        Ok(match body {
            ListBody::Bare(items) => items,
            ListBody::Wrapped { data } => data,
        })
    }

    fn get(&self, id: &str) -> DeskResult<T> {
        self.client
            .get(&Self::item_path(id))
            .map_err(|e| Self::map_missing(e, id))
    }

    fn create(&mut self, item: T) -> DeskResult<T> {
        item.validate()?;
        self.client.post(T::KIND.resource(), &item)
    }

    fn update(&mut self, id: &str, patch: &Value) -> DeskResult<T> {
        let current = self.get(id)?;
        let updated = apply_patch(&current, patch)?;
        self.client
            .put(&Self::item_path(id), &updated)
            .map_err(|e| Self::map_missing(e, id))
    }

    fn delete(&mut self, id: &str) -> DeskResult<()> {
        self.client
            .delete(&Self::item_path(id))
            .map_err(|e| Self::map_missing(e, id))
    }
}
