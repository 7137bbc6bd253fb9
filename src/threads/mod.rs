//! Comments and suggestion messages.
//!
//! Both live in a child collection of a suggestion and differ only in the
//! collection name and whether writes bump the suggestion's `lastActivityAt`.
//! That bump is a second request after the child write: readers can briefly
//! see a new child before the parent's activity stamp moves.

mod format;

pub use format::{format_timestamp, format_timestamp_now};

use crate::firestore::{
    add_document, CollectionPath, Direction, DocumentPath, DocumentStore, FieldValue, Fields,
    Query, StoreResult,
};
use crate::models::{ThreadEntry, CREATED_AT, EDITED_AT, LAST_ACTIVITY_AT};

pub(crate) const SUGGESTIONS: &str = "suggestions";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadCollection {
    collection_id: &'static str,
    touch_parent: bool,
}

/// Public comments on a suggestion.
pub const COMMENTS: ThreadCollection = ThreadCollection {
    collection_id: "comments",
    touch_parent: false,
};

/// Private messages between a suggestion's author and moderators.
pub const SUGGESTION_MESSAGES: ThreadCollection = ThreadCollection {
    collection_id: "suggestionMessages",
    touch_parent: true,
};

pub(crate) fn suggestion_doc(suggestion_id: &str) -> StoreResult<DocumentPath> {
    CollectionPath::root(SUGGESTIONS)?.doc(suggestion_id)
}

impl ThreadCollection {
    pub fn collection_id(&self) -> &'static str {
        self.collection_id
    }

    pub fn collection(&self, suggestion_id: &str) -> StoreResult<CollectionPath> {
        suggestion_doc(suggestion_id)?.collection(self.collection_id)
    }

    async fn touch<S: DocumentStore>(&self, store: &S, suggestion_id: &str) -> StoreResult<()> {
        if !self.touch_parent {
            return Ok(());
        }
        store
            .update(&suggestion_doc(suggestion_id)?, Fields::new(), &[LAST_ACTIVITY_AT])
            .await
    }

    /// Store `payload` with a server `createdAt` and a null `editedAt`.
    pub async fn create<S: DocumentStore>(
        &self,
        store: &S,
        suggestion_id: &str,
        mut payload: Fields,
    ) -> StoreResult<DocumentPath> {
        let coll = self.collection(suggestion_id)?;
        payload.insert(EDITED_AT.to_string(), FieldValue::null());

        let doc = add_document(store, &coll, payload, &[CREATED_AT]).await?;
        self.touch(store, suggestion_id).await?;
        Ok(doc)
    }

    /// Merge `partial` and stamp a fresh `editedAt`. `createdAt` is never
    /// overwritten.
    pub async fn update<S: DocumentStore>(
        &self,
        store: &S,
        suggestion_id: &str,
        entity_id: &str,
        mut partial: Fields,
    ) -> StoreResult<()> {
        let doc = self.collection(suggestion_id)?.doc(entity_id)?;
        partial.remove(CREATED_AT);

        store.update(&doc, partial, &[EDITED_AT]).await?;
        self.touch(store, suggestion_id).await
    }

    /// Permanent delete; no tombstone, no cascade.
    pub async fn delete<S: DocumentStore>(
        &self,
        store: &S,
        suggestion_id: &str,
        entity_id: &str,
    ) -> StoreResult<()> {
        let doc = self.collection(suggestion_id)?.doc(entity_id)?;
        store.delete(&doc).await
    }

    /// All entries of the thread, oldest first.
    pub fn query(&self, suggestion_id: &str) -> StoreResult<Query> {
        Ok(Query::collection(&self.collection(suggestion_id)?)
            .order_by(CREATED_AT, Direction::Ascending))
    }

    /// Run [`Self::query`] and decode the entries.
    pub async fn load<S: DocumentStore>(
        &self,
        store: &S,
        suggestion_id: &str,
    ) -> StoreResult<Vec<ThreadEntry>> {
        let docs = store.run_query(&self.query(suggestion_id)?).await?;
        Ok(docs.iter().map(ThreadEntry::from_document).collect())
    }
}
