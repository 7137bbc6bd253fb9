use super::value::Fields;
use super::{Direction, Document, DocumentPath, DocumentStore, Query, StoreError, StoreResult};
use crate::config::FirestoreConfig;
use serde::{Deserialize, Serialize};

/// Firestore REST client.
///
/// Holds only configuration and the caller's id token, so it is cheap to clone
/// into signals; an HTTP client is built per request.
#[derive(Clone, Debug)]
pub struct FirestoreClient {
    config: FirestoreConfig,
    id_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest {
    writes: Vec<Write>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Write {
    update: WireDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    update_transforms: Vec<FieldTransform>,
    current_document: Precondition,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentMask {
    field_paths: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
    field_path: String,
    set_to_server_value: &'static str,
}

#[derive(Serialize)]
struct Precondition {
    exists: bool,
}

#[derive(Deserialize, Debug)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<WireDocument>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteMode {
    Create,
    Merge,
}

/// Quote a field name unless it is a plain identifier.
pub(crate) fn quote_field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn direction_name(d: Direction) -> &'static str {
    match d {
        Direction::Ascending => "ASCENDING",
        Direction::Descending => "DESCENDING",
    }
}

/// Build the single-write commit body for a create or merge.
fn commit_body(
    name: String,
    mut fields: Fields,
    server_timestamps: &[&str],
    mode: WriteMode,
) -> CommitRequest {
    // A field cannot be both written and transformed in one write.
    for f in server_timestamps {
        fields.remove(*f);
    }

    let update_mask = match mode {
        WriteMode::Create => None,
        WriteMode::Merge => Some(DocumentMask {
            field_paths: fields.keys().map(|k| quote_field_path(k)).collect(),
        }),
    };

    let update_transforms = server_timestamps
        .iter()
        .map(|f| FieldTransform {
            field_path: quote_field_path(f),
            set_to_server_value: "REQUEST_TIME",
        })
        .collect();

    CommitRequest {
        writes: vec![Write {
            update: WireDocument { name, fields },
            update_mask,
            update_transforms,
            current_document: Precondition {
                exists: mode == WriteMode::Merge,
            },
        }],
    }
}

fn structured_query(query: &Query) -> serde_json::Value {
    let mut sq = serde_json::json!({
        "from": [{ "collectionId": query.collection_id }],
    });

    let mut filters: Vec<serde_json::Value> = query
        .filters
        .iter()
        .map(|f| {
            serde_json::json!({
                "fieldFilter": {
                    "field": { "fieldPath": quote_field_path(&f.field) },
                    "op": "EQUAL",
                    "value": f.value,
                }
            })
        })
        .collect();

    if filters.len() == 1 {
        sq["where"] = filters.remove(0);
    } else if !filters.is_empty() {
        sq["where"] = serde_json::json!({
            "compositeFilter": { "op": "AND", "filters": filters }
        });
    }

    if !query.order_by.is_empty() {
        sq["orderBy"] = query
            .order_by
            .iter()
            .map(|o| {
                serde_json::json!({
                    "field": { "fieldPath": quote_field_path(&o.field) },
                    "direction": direction_name(o.direction),
                })
            })
            .collect();
    }

    if let Some(n) = query.limit {
        sq["limit"] = serde_json::json!(n);
    }

    serde_json::json!({ "structuredQuery": sq })
}

/// `projects/p/databases/d/documents/a/b` -> `a/b`.
fn document_from_wire(doc: WireDocument) -> StoreResult<Document> {
    let Some((_, rel)) = doc.name.split_once("/documents/") else {
        return Err(StoreError::Parse(format!(
            "document name without /documents/: {}",
            doc.name
        )));
    };
    Ok(Document {
        path: DocumentPath::parse(rel)?,
        fields: doc.fields,
    })
}

fn encode_path(doc: &DocumentPath) -> String {
    doc.segments()
        .iter()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            config,
            id_token: None,
        }
    }

    pub fn with_id_token(mut self, token: Option<String>) -> Self {
        self.id_token = token;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.config.project_id.trim().is_empty()
    }

    fn database_name(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.config.project_id, self.config.database_id
        )
    }

    fn resource_name(&self, doc: &DocumentPath) -> String {
        format!("{}/documents/{}", self.database_name(), doc)
    }

    fn url(&self, suffix: &str) -> String {
        let mut url = format!(
            "{}/v1/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.database_name(),
            suffix
        );
        if let Some(key) = &self.config.api_key {
            url.push_str("?key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<&String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&impl Serialize>,
    ) -> StoreResult<T> {
        let client = reqwest::Client::new();
        let mut req = client.request(method, url);
        req = Self::with_auth_headers(req, self.id_token.as_ref());

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(StoreError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(StoreError::parse)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(StoreError::from_status(status, body))
        }
    }

    async fn commit(&self, body: CommitRequest) -> StoreResult<()> {
        let _: serde_json::Value = self
            .request(reqwest::Method::POST, self.url("documents:commit"), Some(&body))
            .await?;
        Ok(())
    }
}

impl DocumentStore for FirestoreClient {
    async fn create(
        &self,
        doc: &DocumentPath,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()> {
        self.commit(commit_body(
            self.resource_name(doc),
            fields,
            server_timestamps,
            WriteMode::Create,
        ))
        .await
    }

    async fn update(
        &self,
        doc: &DocumentPath,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> StoreResult<()> {
        self.commit(commit_body(
            self.resource_name(doc),
            fields,
            server_timestamps,
            WriteMode::Merge,
        ))
        .await
    }

    async fn delete(&self, doc: &DocumentPath) -> StoreResult<()> {
        let url = self.url(&format!("documents/{}", encode_path(doc)));
        let _: serde_json::Value = self
            .request(reqwest::Method::DELETE, url, None::<&()>)
            .await?;
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let suffix = match &query.parent {
            Some(parent) => format!("documents/{}:runQuery", encode_path(parent)),
            None => "documents:runQuery".to_string(),
        };

        let items: Vec<RunQueryItem> = self
            .request(
                reqwest::Method::POST,
                self.url(&suffix),
                Some(&structured_query(query)),
            )
            .await?;

        // Items without `document` only carry readTime / progress info.
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(document_from_wire)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::{CollectionPath, FieldValue};

    fn client() -> FirestoreClient {
        FirestoreClient::new(FirestoreConfig {
            project_id: "mc-prices".to_string(),
            database_id: "(default)".to_string(),
            api_url: "https://firestore.googleapis.com/".to_string(),
            api_key: Some("k 1".to_string()),
        })
    }

    #[test]
    fn test_quote_field_path() {
        assert_eq!(quote_field_path("createdAt"), "createdAt");
        assert_eq!(quote_field_path("_x1"), "_x1");
        assert_eq!(quote_field_path("1st"), "`1st`");
        assert_eq!(quote_field_path("a.b"), "`a.b`");
        assert_eq!(quote_field_path("we`ird"), "`we\\`ird`");
    }

    #[test]
    fn test_url_includes_database_and_key() {
        let c = client();
        assert_eq!(
            c.url("documents:commit"),
            "https://firestore.googleapis.com/v1/projects/mc-prices/databases/(default)/documents:commit?key=k%201"
        );
    }

    #[test]
    fn test_resource_name() {
        let c = client();
        let doc = CollectionPath::root("suggestions")
            .and_then(|s| s.doc("s1"))
            .expect("valid");
        assert_eq!(
            c.resource_name(&doc),
            "projects/mc-prices/databases/(default)/documents/suggestions/s1"
        );
    }

    #[test]
    fn test_create_body_requires_absence_and_transforms_timestamp() {
        let mut fields = Fields::new();
        fields.insert("text".into(), "hi".into());
        fields.insert("editedAt".into(), FieldValue::null());
        fields.insert("createdAt".into(), "client value".into());

        let body = commit_body("n".into(), fields, &["createdAt"], WriteMode::Create);
        let v = serde_json::to_value(&body).expect("serialize");
        let w = &v["writes"][0];

        assert_eq!(w["currentDocument"]["exists"], false);
        assert!(w.get("updateMask").is_none());
        assert_eq!(w["update"]["fields"]["text"]["stringValue"], "hi");
        assert!(w["update"]["fields"].get("createdAt").is_none());
        assert_eq!(w["updateTransforms"][0]["fieldPath"], "createdAt");
        assert_eq!(w["updateTransforms"][0]["setToServerValue"], "REQUEST_TIME");
    }

    #[test]
    fn test_merge_body_masks_only_named_fields() {
        let mut fields = Fields::new();
        fields.insert("text".into(), "edited".into());

        let body = commit_body("n".into(), fields, &["editedAt"], WriteMode::Merge);
        let v = serde_json::to_value(&body).expect("serialize");
        let w = &v["writes"][0];

        assert_eq!(w["currentDocument"]["exists"], true);
        assert_eq!(w["updateMask"]["fieldPaths"], serde_json::json!(["text"]));
        assert_eq!(w["updateTransforms"][0]["fieldPath"], "editedAt");
    }

    #[test]
    fn test_touch_only_merge_has_empty_mask() {
        let body = commit_body("n".into(), Fields::new(), &["lastActivityAt"], WriteMode::Merge);
        let v = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            v["writes"][0]["updateMask"]["fieldPaths"],
            serde_json::json!([])
        );
    }

    #[test]
    fn test_structured_query_shape() {
        let coll = CollectionPath::root("suggestions")
            .and_then(|s| s.doc("s1"))
            .and_then(|d| d.collection("comments"))
            .expect("valid");
        let q = Query::collection(&coll).order_by("createdAt", Direction::Ascending);
        let v = structured_query(&q);
        assert_eq!(v["structuredQuery"]["from"][0]["collectionId"], "comments");
        assert_eq!(
            v["structuredQuery"]["orderBy"][0]["direction"],
            "ASCENDING"
        );
        assert!(v["structuredQuery"].get("where").is_none());

        let q = Query::collection(&CollectionPath::root("suggestions").expect("valid"))
            .where_eq("userId", "u1");
        let v = structured_query(&q);
        assert_eq!(
            v["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"],
            "u1"
        );

        let q = q.where_eq("status", "open").limit(5);
        let v = structured_query(&q);
        assert_eq!(
            v["structuredQuery"]["where"]["compositeFilter"]["filters"]
                .as_array()
                .map(|a| a.len()),
            Some(2)
        );
        assert_eq!(v["structuredQuery"]["limit"], 5);
    }

    #[test]
    fn test_run_query_response_skips_read_time_only_items() {
        let raw = serde_json::json!([
            { "readTime": "2024-01-01T00:00:00Z" },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/suggestions/s1/comments/c1",
                    "fields": { "text": { "stringValue": "hello" } },
                    "createTime": "2024-01-01T00:00:00Z"
                },
                "readTime": "2024-01-01T00:00:00Z"
            }
        ]);
        let items: Vec<RunQueryItem> = serde_json::from_value(raw).expect("parse");
        let docs: Vec<Document> = items
            .into_iter()
            .filter_map(|i| i.document)
            .map(document_from_wire)
            .collect::<StoreResult<_>>()
            .expect("valid documents");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "c1");
        assert_eq!(docs[0].path.to_string(), "suggestions/s1/comments/c1");
        assert_eq!(docs[0].str_field("text"), Some("hello"));
    }

    #[test]
    fn test_document_from_wire_rejects_foreign_names() {
        let doc = WireDocument {
            name: "nonsense".to_string(),
            fields: Fields::new(),
        };
        assert!(matches!(document_from_wire(doc), Err(StoreError::Parse(_))));
    }
}
