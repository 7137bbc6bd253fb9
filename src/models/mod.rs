use crate::firestore::{Document, FieldValue};
use serde::{Deserialize, Serialize};

pub(crate) const CREATED_AT: &str = "createdAt";
pub(crate) const EDITED_AT: &str = "editedAt";
pub(crate) const LAST_ACTIVITY_AT: &str = "lastActivityAt";
pub(crate) const USER_ID: &str = "userId";

/// A priced entry in the `items` collection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: Option<f64>,
    pub category: Option<String>,
}

impl CatalogItem {
    /// Items without a usable name are not listed.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let name = doc.str_field("name")?.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            id: doc.id().to_string(),
            name: name.to_string(),
            price: doc.get("price").and_then(FieldValue::as_f64),
            category: doc
                .str_field("category")
                .map(str::to_string)
                .filter(|c| !c.trim().is_empty()),
        })
    }
}

/// A user-submitted discussion thread.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub last_activity_ms: Option<i64>,
}

impl Suggestion {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id().to_string(),
            user_id: doc.str_field(USER_ID).unwrap_or_default().to_string(),
            title: doc.str_field("title").unwrap_or_default().to_string(),
            last_activity_ms: doc.millis(LAST_ACTIVITY_AT),
        }
    }
}

/// A comment or suggestion message as shown in a thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadEntry {
    pub id: String,
    pub text: String,
    pub author: Option<String>,
    pub created_ms: Option<i64>,
    /// `None` until the first edit.
    pub edited_ms: Option<i64>,
}

impl ThreadEntry {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id().to_string(),
            text: doc.str_field("text").unwrap_or_default().to_string(),
            author: doc.str_field("authorName").map(str::to_string),
            created_ms: doc.millis(CREATED_AT),
            edited_ms: doc.millis(EDITED_AT),
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited_ms.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecentItem {
    pub id: String,
    pub name: String,
    pub picked_ms: i64,
}
