use std::cell::RefCell;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub const KEY_PRINCIPAL: &str = "session.principal";
pub const KEY_DATA_SOURCE_MODE: &str = "dataSource.mode";
pub const KEY_DATA_SOURCE_BASE_URL: &str = "dataSource.baseUrl";
pub const KEY_CALENDAR_EVENTS: &str = "calendar.events";
pub const KEY_UI_PREFERENCES: &str = "ui.preferences";
pub const KEY_PASSWORD_OVERRIDES: &str = "auth.passwordOverrides";

/// Durable string key/value storage.
///
/// Writes are independent per key; there is no transaction spanning keys, so
/// readers must tolerate any subset of keys being present.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

pub fn put_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

/// Reads and decodes a JSON value.
///
/// The outer result reports storage failures, the inner one decode failures so
/// callers can recover malformed values without hiding I/O problems.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> anyhow::Result<Option<Result<T, serde_json::Error>>> {
    Ok(store
        .get(key)?
        .map(|text| serde_json::from_str::<T>(&text)))
}

/// In-process store used by tests and by hosts without a workspace.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_json_separates_missing_and_malformed() {
        let store = MemoryStore::new();
        let missing: Option<Result<Vec<u32>, _>> = get_json(&store, "k").expect("get");
        assert!(missing.is_none());

        store.set("k", "{not json").expect("set");
        let bad: Option<Result<Vec<u32>, _>> = get_json(&store, "k").expect("get");
        assert!(matches!(bad, Some(Err(_))));

        put_json(&store, "k", &vec![1u32, 2]).expect("put");
        let good: Option<Result<Vec<u32>, _>> = get_json(&store, "k").expect("get");
        assert_eq!(good.expect("present").expect("decode"), vec![1, 2]);
    }
}
