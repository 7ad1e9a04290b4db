use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{Collection, Condition, DocumentStore, StoreError, StoreQuery};

/// Documents requested per list call unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub users: String,
    pub restaurants: String,
    pub reservations: String,
    pub chat_messages: String,
    pub notifications: String,
}

impl AppwriteCollections {
    fn id(&self, collection: Collection) -> &str {
        match collection {
            Collection::Users => &self.users,
            Collection::Restaurants => &self.restaurants,
            Collection::Reservations => &self.reservations,
            Collection::ChatMessages => &self.chat_messages,
            Collection::Notifications => &self.notifications,
        }
    }
}

/// Document store backed by the Appwrite databases REST API
///
/// Equality and lower-bound conditions are sent to Appwrite as query strings.
/// Case-insensitive substring conditions have no Appwrite equivalent and are
/// evaluated on the returned documents.
pub struct AppwriteStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
    page_size: usize,
}

/// One page of a document listing
struct DocumentPage {
    total: u64,
    documents: Vec<Value>,
}

impl AppwriteStore {
    /// Create a new Appwrite store client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the number of documents fetched per list request
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn documents_url(&self, collection: Collection) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collections.id(collection)
        )
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            urlencoding::encode(id)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    async fn check(response: Response, action: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Appwrite {} failed: {} - {}", action, status, body);
        Err(StoreError::ApiError(format!("Failed to {}: {}", action, status)))
    }
}

/// Translate pushable conditions into Appwrite query strings
pub(crate) fn appwrite_queries(query: &StoreQuery) -> Vec<String> {
    query
        .conditions
        .iter()
        .filter_map(|(field, condition)| match condition {
            Condition::Equals(value) => Some(format!("equal(\"{}\", [{}])", field, value)),
            Condition::AtLeast(bound) => Some(format!("greaterThanEqual(\"{}\", {})", field, bound)),
            Condition::ContainsIgnoreCase(_) => None,
        })
        .collect()
}

fn page_queries(page_size: usize, offset: usize) -> [String; 2] {
    [format!("limit({})", page_size), format!("offset({})", offset)]
}

/// Strip Appwrite system attributes and keep our own `id`
///
/// Appwrite returns attributes at the top level of the document, next to the
/// `$`-prefixed system fields.
fn document_data(document: &Value) -> Value {
    let Some(object) = document.as_object() else {
        return document.clone();
    };

    let mut data: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if !data.contains_key("id") {
        if let Some(id) = object.get("$id") {
            data.insert("id".to_string(), id.clone());
        }
    }

    Value::Object(data)
}

impl AppwriteStore {
    async fn list_page(
        &self,
        collection: Collection,
        conditions: &[String],
        offset: usize,
    ) -> Result<DocumentPage, StoreError> {
        let params: Vec<(&str, String)> = conditions
            .iter()
            .cloned()
            .chain(page_queries(self.page_size, offset))
            .map(|q| ("queries[]", q))
            .collect();

        let response = self
            .authorized(self.client.get(self.documents_url(collection)))
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response, "query documents").await?;

        let mut json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);
        let documents = match json.get_mut("documents").map(Value::take) {
            Some(Value::Array(documents)) => documents,
            _ => return Err(StoreError::InvalidDocument("Missing documents array".into())),
        };

        Ok(DocumentPage { total, documents })
    }
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn find(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Value>, StoreError> {
        let conditions = appwrite_queries(query);
        let mut matched = Vec::new();
        let mut offset = 0;

        // Substring conditions are applied per page, so every page must be read
        loop {
            let page = self.list_page(collection, &conditions, offset).await?;
            let fetched = page.documents.len();
            offset += fetched;

            matched.extend(
                page.documents
                    .iter()
                    .map(document_data)
                    .filter(|doc| query.matches(doc)),
            );

            if fetched < self.page_size || offset as u64 >= page.total {
                tracing::debug!(
                    "Queried {:?}: {} documents matched (total: {})",
                    collection,
                    matched.len(),
                    page.total
                );
                break;
            }
        }

        Ok(matched)
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .authorized(self.client.get(self.document_url(collection, id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, "fetch document").await?;

        let json: Value = response.json().await?;
        Ok(Some(document_data(&json)))
    }

    async fn insert_one(&self, collection: Collection, id: &str, mut document: Value) -> Result<Value, StoreError> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;
        object.insert("id".to_string(), Value::String(id.to_string()));

        let payload = json!({
            "documentId": id,
            "data": document,
        });

        let response = self
            .authorized(self.client.post(self.documents_url(collection)))
            .json(&payload)
            .send()
            .await?;
        let response = Self::check(response, "create document").await?;

        let json: Value = response.json().await?;

        tracing::debug!("Created document {} in {:?}", id, collection);

        Ok(document_data(&json))
    }

    async fn update_one(&self, collection: Collection, id: &str, changes: Value) -> Result<Option<Value>, StoreError> {
        let response = self
            .authorized(self.client.patch(self.document_url(collection, id)))
            .json(&json!({ "data": changes }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, "update document").await?;

        let json: Value = response.json().await?;
        Ok(Some(document_data(&json)))
    }

    async fn ping(&self) -> Result<bool, StoreError> {
        let url = format!(
            "{}/databases/{}",
            self.base_url.trim_end_matches('/'),
            self.database_id
        );
        let response = self.authorized(self.client.get(url)).send().await?;
        Ok(response.status().is_success())
    }
}
