use crate::config::FirestoreConfig;
use crate::firestore::FirestoreClient;
use crate::models::{CatalogItem, RecentItem};
use crate::storage::{load_id_token, load_recent_items, load_user_id, BrowserStorage};
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub store: RwSignal<FirestoreClient>,

    /// Set by the sign-in flow; suggestion pages need it.
    pub current_user_id: RwSignal<Option<String>>,

    pub catalog: RwSignal<Vec<CatalogItem>>,
    pub catalog_loading: RwSignal<bool>,
    pub catalog_error: RwSignal<Option<String>>,

    /// Most recently picked catalog items, newest first.
    pub recent_items: RwSignal<Vec<RecentItem>>,

    /// Drives the dot on the Suggestions nav link.
    pub has_unread: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        let storage = BrowserStorage;
        let client = FirestoreClient::new(FirestoreConfig::from_window_env())
            .with_id_token(load_id_token(&storage));

        Self {
            store: RwSignal::new(client),
            current_user_id: RwSignal::new(load_user_id(&storage)),
            catalog: RwSignal::new(vec![]),
            catalog_loading: RwSignal::new(false),
            catalog_error: RwSignal::new(None),
            recent_items: RwSignal::new(load_recent_items(&storage)),
            has_unread: RwSignal::new(false),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
