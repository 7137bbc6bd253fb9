use crate::firestore::{CollectionPath, Direction, DocumentStore, Query, StoreResult};
use crate::models::CatalogItem;

const ITEMS: &str = "items";

/// Whole catalog, alphabetical.
pub fn catalog_query() -> StoreResult<Query> {
    Ok(Query::collection(&CollectionPath::root(ITEMS)?).order_by("name", Direction::Ascending))
}

pub async fn load_catalog<S: DocumentStore>(store: &S) -> StoreResult<Vec<CatalogItem>> {
    let docs = store.run_query(&catalog_query()?).await?;
    Ok(docs.iter().filter_map(CatalogItem::from_document).collect())
}
