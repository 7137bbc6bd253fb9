use crate::firestore::{CollectionPath, DocumentStore, Query, StoreResult};
use crate::models::{Suggestion, USER_ID};
use crate::storage::KeyValueStorage;
use crate::threads::SUGGESTIONS;
use crate::util::now_ms;
use leptos::logging::error;

fn marker_key(user_id: &str) -> String {
    format!("lastCheckedSuggestions_{user_id}")
}

fn present(user_id: Option<&str>) -> Option<&str> {
    user_id.filter(|id| !id.trim().is_empty())
}

/// Suggestions owned by `user_id`.
pub fn user_suggestions_query(user_id: &str) -> StoreResult<Query> {
    Ok(Query::collection(&CollectionPath::root(SUGGESTIONS)?).where_eq(USER_ID, user_id))
}

/// The user's suggestions, most recently active first.
pub async fn load_user_suggestions<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> StoreResult<Vec<Suggestion>> {
    let docs = store.run_query(&user_suggestions_query(user_id)?).await?;
    let mut out: Vec<Suggestion> = docs.iter().map(Suggestion::from_document).collect();
    out.sort_by(|a, b| b.last_activity_ms.cmp(&a.last_activity_ms));
    Ok(out)
}

/// Unread tracking for a user's suggestion threads.
///
/// The last-seen marker lives in local storage, so it is per user and per
/// browser.
pub struct NotificationTracker<'a, S, K> {
    store: &'a S,
    storage: &'a K,
    clock: fn() -> i64,
}

impl<'a, S: DocumentStore, K: KeyValueStorage> NotificationTracker<'a, S, K> {
    pub fn new(store: &'a S, storage: &'a K) -> Self {
        Self {
            store,
            storage,
            clock: now_ms,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Stored marker, if one was ever written and parses.
    pub fn last_checked(&self, user_id: Option<&str>) -> Option<i64> {
        let user_id = present(user_id)?;
        self.storage
            .get_item(&marker_key(user_id))
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn mark_seen(&self, user_id: Option<&str>) {
        let Some(user_id) = present(user_id) else {
            return;
        };
        self.storage
            .set_item(&marker_key(user_id), &(self.clock)().to_string());
    }

    /// Whether any of the user's suggestions saw activity after the marker.
    ///
    /// Fails closed: a missing user, no suggestions, or any store error all
    /// report `false`. The first check for a user only plants the marker.
    pub async fn check_updates(&self, user_id: Option<&str>) -> bool {
        let Some(user_id) = present(user_id) else {
            return false;
        };

        match self.unread_since_marker(user_id).await {
            Ok(unread) => unread,
            Err(e) => {
                error!("suggestion update check failed for {user_id}: {e}");
                false
            }
        }
    }

    async fn unread_since_marker(&self, user_id: &str) -> StoreResult<bool> {
        let docs = self
            .store
            .run_query(&user_suggestions_query(user_id)?)
            .await?;
        if docs.is_empty() {
            return Ok(false);
        }

        let Some(marker) = self.last_checked(Some(user_id)) else {
            self.mark_seen(Some(user_id));
            return Ok(false);
        };

        Ok(docs
            .iter()
            .map(Suggestion::from_document)
            .any(|s| s.last_activity_ms.is_some_and(|t| t > marker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::memory::MemoryStore;
    use crate::firestore::{FieldValue, Fields};
    use crate::storage::MemoryStorage;
    use crate::threads::{suggestion_doc, SUGGESTION_MESSAGES};
    use chrono::{DateTime, Utc};
    use futures::executor::block_on;

    // 2024-01-01T00:00:00Z
    const T0: i64 = 1_704_067_200_000;

    fn clock_t0() -> i64 {
        T0
    }

    fn seed(store: &MemoryStore, id: &str, user_id: &str, activity_ms: Option<i64>) {
        let mut f = Fields::new();
        f.insert(USER_ID.to_string(), user_id.into());
        f.insert("title".to_string(), "Price for elytra".into());
        if let Some(ms) = activity_ms {
            let ts = DateTime::<Utc>::from_timestamp_millis(ms).expect("valid millis");
            f.insert("lastActivityAt".to_string(), FieldValue::TimestampValue(ts));
        }
        store.insert(&suggestion_doc(id).expect("valid"), f);
    }

    #[test]
    fn test_absent_user_reports_false_and_writes_nothing() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        let t = NotificationTracker::new(&store, &storage);

        assert!(!block_on(t.check_updates(None)));
        assert!(!block_on(t.check_updates(Some("  "))));
        t.mark_seen(None);
        assert!(t.last_checked(None).is_none());
        assert_eq!(store.request_count(), 0);
    }

    #[test]
    fn test_user_without_suggestions_reports_false() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        seed(&store, "s1", "someone-else", Some(T0 + 1));
        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);

        assert!(!block_on(t.check_updates(Some("u1"))));
        assert!(t.last_checked(Some("u1")).is_none());
    }

    #[test]
    fn test_first_check_plants_marker_without_notifying() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        seed(&store, "s1", "u1", Some(T0 - 1000));
        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);

        assert!(!block_on(t.check_updates(Some("u1"))));
        assert_eq!(t.last_checked(Some("u1")), Some(T0));
        assert_eq!(
            storage.get_item("lastCheckedSuggestions_u1").as_deref(),
            Some("1704067200000")
        );

        // No new activity since.
        assert!(!block_on(t.check_updates(Some("u1"))));
    }

    #[test]
    fn test_activity_after_marker_is_unread() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        seed(&store, "s1", "u1", Some(T0 - 5000));
        seed(&store, "s2", "u1", None);
        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);
        t.mark_seen(Some("u1"));

        assert!(!block_on(t.check_updates(Some("u1"))));

        seed(&store, "s3", "u1", Some(T0 + 1));
        assert!(block_on(t.check_updates(Some("u1"))));

        t.mark_seen(Some("u1"));
        seed(&store, "s3", "u1", Some(T0));
        assert!(!block_on(t.check_updates(Some("u1"))), "equal stamp is not newer");
    }

    #[test]
    fn test_message_activity_turns_marker_stale() {
        let store = MemoryStore::starting_at(
            DateTime::<Utc>::from_timestamp_millis(T0).expect("valid millis"),
        );
        let storage = MemoryStorage::default();
        seed(&store, "s1", "u1", Some(T0 - 1000));
        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);

        assert!(!block_on(t.check_updates(Some("u1"))));

        let mut payload = Fields::new();
        payload.insert("text".to_string(), "Moderator reply".into());
        block_on(SUGGESTION_MESSAGES.create(&store, "s1", payload)).expect("create");

        assert!(block_on(t.check_updates(Some("u1"))));
    }

    #[test]
    fn test_load_user_suggestions_most_recent_first() {
        let store = MemoryStore::new();
        seed(&store, "old", "u1", Some(T0 - 1000));
        seed(&store, "new", "u1", Some(T0));
        seed(&store, "quiet", "u1", None);
        seed(&store, "theirs", "u2", Some(T0 + 1000));

        let list = block_on(load_user_suggestions(&store, "u1")).expect("load");
        let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "quiet"]);
        assert_eq!(list[0].title, "Price for elytra");
    }

    #[test]
    fn test_store_error_is_swallowed() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        seed(&store, "s1", "u1", Some(T0 + 10));
        storage.set_item("lastCheckedSuggestions_u1", "0");
        store.set_failing(true);

        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);
        assert!(!block_on(t.check_updates(Some("u1"))));
    }

    #[test]
    fn test_unparseable_marker_is_replanted() {
        let store = MemoryStore::new();
        let storage = MemoryStorage::default();
        seed(&store, "s1", "u1", Some(T0 + 10));
        storage.set_item("lastCheckedSuggestions_u1", "yesterday");

        let t = NotificationTracker::new(&store, &storage).with_clock(clock_t0);
        assert!(t.last_checked(Some("u1")).is_none());
        assert!(!block_on(t.check_updates(Some("u1"))));
        assert_eq!(t.last_checked(Some("u1")), Some(T0));
    }
}
