use crate::models::RecentItem;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

pub(crate) const USER_ID_KEY: &str = "mcprice_user_id";
pub(crate) const ID_TOKEN_KEY: &str = "mcprice_id_token";
pub(crate) const RECENT_ITEMS_KEY: &str = "mcprice_recent_items";

const MAX_RECENT_ITEMS: usize = 8;

/// String key/value persistence (browser `localStorage` in the app).
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// `window.localStorage`. Unavailable storage and failed writes are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStorage {
    items: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

pub(crate) fn load_json<T: for<'de> Deserialize<'de>>(
    storage: &impl KeyValueStorage,
    key: &str,
) -> Option<T> {
    let json = storage.get_item(key)?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json<T: Serialize>(storage: &impl KeyValueStorage, key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        storage.set_item(key, &json);
    }
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

/// Signed-in user id, written by the auth layer.
pub(crate) fn load_user_id(storage: &impl KeyValueStorage) -> Option<String> {
    storage
        .get_item(USER_ID_KEY)
        .filter(|id| !id.trim().is_empty())
}

pub(crate) fn load_id_token(storage: &impl KeyValueStorage) -> Option<String> {
    storage
        .get_item(ID_TOKEN_KEY)
        .filter(|t| !t.trim().is_empty())
}

pub(crate) fn load_recent_items(storage: &impl KeyValueStorage) -> Vec<RecentItem> {
    load_json::<Vec<RecentItem>>(storage, RECENT_ITEMS_KEY).unwrap_or_default()
}

/// Record a picked item and return the updated list (most recent first).
pub(crate) fn write_recent_item(
    storage: &impl KeyValueStorage,
    id: &str,
    name: &str,
) -> Vec<RecentItem> {
    if id.trim().is_empty() {
        return load_recent_items(storage);
    }

    let item = RecentItem {
        id: id.to_string(),
        name: name.to_string(),
        picked_ms: now_ms(),
    };

    let next = upsert_lru_by_key(
        load_recent_items(storage),
        item,
        |a, b| a.id == b.id,
        MAX_RECENT_ITEMS,
    );
    save_json(storage, RECENT_ITEMS_KEY, &next);
    next
}
