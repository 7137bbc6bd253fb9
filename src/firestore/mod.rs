//! Hierarchical document store access.
//!
//! Callers work against the [`DocumentStore`] trait; the app injects a
//! [`FirestoreClient`] and tests inject an in-memory store.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod value;

pub use client::FirestoreClient;
pub use error::{StoreError, StoreResult};
pub use value::{fields_from_json, ArrayValue, FieldValue, Fields, GeoPoint, MapValue};

use std::fmt;

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const AUTO_ID_LEN: usize = 20;

fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.trim().is_empty() || segment.contains('/') {
        return Err(StoreError::InvalidPath(format!("bad path segment {segment:?}")));
    }
    Ok(())
}

/// Path to a collection: an odd number of segments (`suggestions`,
/// `suggestions/{id}/comments`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path to a document: an even number of segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    pub fn root(collection_id: &str) -> StoreResult<Self> {
        validate_segment(collection_id)?;
        Ok(Self {
            segments: vec![collection_id.to_string()],
        })
    }

    pub fn doc(&self, id: &str) -> StoreResult<DocumentPath> {
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocumentPath { segments })
    }

    /// Last segment.
    pub fn collection_id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Owning document, `None` for root collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl DocumentPath {
    /// Parse a slash-separated relative path such as `suggestions/abc`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(format!(
                "{path:?} does not name a document"
            )));
        }
        for s in &segments {
            validate_segment(s)?;
        }
        Ok(Self { segments })
    }

    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn collection(&self, collection_id: &str) -> StoreResult<CollectionPath> {
        validate_segment(collection_id)?;
        let mut segments = self.segments.clone();
        segments.push(collection_id.to_string());
        Ok(CollectionPath { segments })
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// A fetched document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Timestamp field as epoch milliseconds.
    pub fn millis(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_millis)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filter; multiple filters are ANDed.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: FieldValue,
}

/// Description of a collection fetch. Building one performs no I/O; hand it to
/// [`DocumentStore::run_query`] to execute.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub parent: Option<DocumentPath>,
    pub collection_id: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn collection(collection: &CollectionPath) -> Self {
        Self {
            parent: collection.parent(),
            collection_id: collection.collection_id().to_string(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }
}

/// Remote document store seam.
///
/// `server_timestamps` names fields the store sets to its own commit time.
/// Every call is a single request; nothing is retried.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Create a document. Fails with [`StoreError::AlreadyExists`] if present.
    async fn create(
        &self,
        doc: &DocumentPath,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()>;

    /// Merge `fields` into an existing document. Keys not named are left as
    /// they are. Fails with [`StoreError::NotFound`] if absent.
    async fn update(
        &self,
        doc: &DocumentPath,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()>;

    async fn delete(&self, doc: &DocumentPath) -> StoreResult<()>;

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>>;
}

/// Random 20-character document id, same alphabet as the Firestore SDKs.
pub fn auto_id() -> StoreResult<String> {
    let mut bytes = [0u8; AUTO_ID_LEN];
    getrandom::getrandom(&mut bytes).map_err(|e| StoreError::Random(e.to_string()))?;

    // 248 is the largest multiple of 62 below 256; re-draw above it to avoid bias.
    let max = 256 - 256 % AUTO_ID_ALPHABET.len();
    let mut out = String::with_capacity(AUTO_ID_LEN);
    let mut buf = [0u8; 1];
    for mut b in bytes {
        while (b as usize) >= max {
            getrandom::getrandom(&mut buf).map_err(|e| StoreError::Random(e.to_string()))?;
            b = buf[0];
        }
        out.push(AUTO_ID_ALPHABET[b as usize % AUTO_ID_ALPHABET.len()] as char);
    }
    Ok(out)
}

/// Create a document with a generated id under `collection`.
pub async fn add_document<S: DocumentStore>(
    store: &S,
    collection: &CollectionPath,
    fields: Fields,
    server_timestamps: &[&str],
) -> StoreResult<DocumentPath> {
    let doc = collection.doc(&auto_id()?)?;
    store.create(&doc, fields, server_timestamps).await?;
    Ok(doc)
}
