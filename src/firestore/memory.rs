use super::{
    Direction, Document, DocumentPath, DocumentStore, FieldValue, Fields, Query, StoreError,
    StoreResult,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// In-process document store for tests.
///
/// Server timestamps come from a fake clock that advances one second per
/// write, so ordering is deterministic.
pub(crate) struct MemoryStore {
    docs: RefCell<BTreeMap<DocumentPath, Fields>>,
    clock: Cell<DateTime<Utc>>,
    failing: Cell<bool>,
    requests: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(365 * 50))
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            docs: RefCell::new(BTreeMap::new()),
            clock: Cell::new(start),
            failing: Cell::new(false),
            requests: Cell::new(0),
        }
    }

    /// Make every following request fail like a rejected remote call.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    pub fn get(&self, doc: &DocumentPath) -> Option<Fields> {
        self.docs.borrow().get(doc).cloned()
    }

    /// Seed a document directly, bypassing the request path.
    pub fn insert(&self, doc: &DocumentPath, fields: Fields) {
        self.docs.borrow_mut().insert(doc.clone(), fields);
    }

    fn begin(&self) -> StoreResult<()> {
        self.requests.set(self.requests.get() + 1);
        if self.failing.get() {
            return Err(StoreError::Network("simulated outage".to_string()));
        }
        Ok(())
    }

    fn tick(&self) -> DateTime<Utc> {
        let next = self.clock.get() + TimeDelta::seconds(1);
        self.clock.set(next);
        next
    }

    fn apply_timestamps(&self, fields: &mut Fields, server_timestamps: &[&str]) {
        if server_timestamps.is_empty() {
            return;
        }
        let now = self.tick();
        for f in server_timestamps {
            fields.insert(f.to_string(), FieldValue::TimestampValue(now));
        }
    }
}

fn sort_key_cmp(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    use FieldValue::*;

    match (a, b) {
        (Some(TimestampValue(x)), Some(TimestampValue(y))) => x.cmp(y),
        (Some(StringValue(x)), Some(StringValue(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        doc: &DocumentPath,
        mut fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()> {
        self.begin()?;
        if self.docs.borrow().contains_key(doc) {
            return Err(StoreError::AlreadyExists(doc.to_string()));
        }
        self.apply_timestamps(&mut fields, server_timestamps);
        self.docs.borrow_mut().insert(doc.clone(), fields);
        Ok(())
    }

    async fn update(
        &self,
        doc: &DocumentPath,
        mut fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()> {
        self.begin()?;
        if !self.docs.borrow().contains_key(doc) {
            return Err(StoreError::NotFound(doc.to_string()));
        }
        self.apply_timestamps(&mut fields, server_timestamps);
        let mut docs = self.docs.borrow_mut();
        if let Some(existing) = docs.get_mut(doc) {
            existing.extend(fields);
        }
        Ok(())
    }

    async fn delete(&self, doc: &DocumentPath) -> StoreResult<()> {
        self.begin()?;
        self.docs.borrow_mut().remove(doc);
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.begin()?;

        let docs = self.docs.borrow();
        let mut out: Vec<Document> = docs
            .iter()
            .filter(|(path, _)| {
                let coll = path.parent();
                coll.collection_id() == query.collection_id && coll.parent() == query.parent
            })
            .filter(|(_, fields)| {
                query
                    .filters
                    .iter()
                    .all(|f| fields.get(&f.field) == Some(&f.value))
            })
            // Documents missing an ordered field are not returned.
            .filter(|(_, fields)| query.order_by.iter().all(|o| fields.contains_key(&o.field)))
            .map(|(path, fields)| Document {
                path: path.clone(),
                fields: fields.clone(),
            })
            .collect();

        out.sort_by(|a, b| {
            for o in &query.order_by {
                let ord = sort_key_cmp(a.get(&o.field), b.get(&o.field));
                let ord = match o.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(n) = query.limit {
            out.truncate(n as usize);
        }
        Ok(out)
    }
}
