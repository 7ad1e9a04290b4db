//! Document store port and its backends.
//!
//! Documents are JSON objects keyed by an `id` field. Queries are conjunctions of
//! conditions on top-level fields and return documents in storage order.

pub mod appwrite;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use appwrite::{AppwriteCollections, AppwriteStore};
pub use memory::MemoryStore;

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Store returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Store backend unavailable: {0}")]
    Unavailable(String),
}

/// Logical collections used by the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Restaurants,
    Reservations,
    ChatMessages,
    Notifications,
}

/// A single predicate on a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the given JSON value
    Equals(Value),
    /// Numeric field is greater than or equal to the bound
    AtLeast(f64),
    /// String field contains the needle, ignoring case
    ContainsIgnoreCase(String),
}

impl Condition {
    /// Evaluate against a field value; a missing field never matches
    pub fn matches(&self, field: Option<&Value>) -> bool {
        let Some(field) = field else {
            return false;
        };

        match self {
            Condition::Equals(expected) => field == expected,
            Condition::AtLeast(bound) => field.as_f64().is_some_and(|v| v >= *bound),
            Condition::ContainsIgnoreCase(needle) => field
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// Conjunction of field conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub conditions: Vec<(String, Condition)>,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Equals(value.into())));
        self
    }

    pub fn at_least(mut self, field: &str, bound: f64) -> Self {
        self.conditions
            .push((field.to_string(), Condition::AtLeast(bound)));
        self
    }

    pub fn contains_ignore_case(mut self, field: &str, needle: impl Into<String>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::ContainsIgnoreCase(needle.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check a document against every condition
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(document.get(field)))
    }
}

/// Port for document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find documents matching the query, in storage order
    async fn find(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Value>, StoreError>;

    /// Get a single document by id
    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    /// Insert a new document under the given id and return it as stored
    async fn insert_one(&self, collection: Collection, id: &str, document: Value) -> Result<Value, StoreError>;

    /// Merge top-level fields into an existing document
    ///
    /// Returns `None` when no document has the given id.
    async fn update_one(&self, collection: Collection, id: &str, changes: Value) -> Result<Option<Value>, StoreError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<bool, StoreError>;
}

/// Deserialize a stored document into a model
pub fn decode<T: DeserializeOwned>(document: Value) -> Result<T, StoreError> {
    serde_json::from_value(document).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

pub fn decode_all<T: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<T>, StoreError> {
    documents.into_iter().map(decode).collect()
}

/// Serialize a model into a storable document
pub fn encode<T: Serialize>(model: &T) -> Result<Value, StoreError> {
    serde_json::to_value(model).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_field_never_matches() {
        let doc = json!({ "name": "Taqueria" });
        assert!(!StoreQuery::new().equals("vegan", true).matches(&doc));
        assert!(!StoreQuery::new().at_least("rating", 0.0).matches(&doc));
    }

    #[test]
    fn test_contains_ignore_case() {
        let doc = json!({ "location": "Downtown Sushi" });
        assert!(StoreQuery::new().contains_ignore_case("location", "down").matches(&doc));
        assert!(StoreQuery::new().contains_ignore_case("location", "SUSHI").matches(&doc));
        assert!(!StoreQuery::new().contains_ignore_case("location", "uptown").matches(&doc));
    }

    #[test]
    fn test_at_least_is_inclusive() {
        let query = StoreQuery::new().at_least("rating", 4.5);
        assert!(query.matches(&json!({ "rating": 4.5 })));
        assert!(!query.matches(&json!({ "rating": 4.4 })));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(StoreQuery::new().matches(&json!({})));
    }

    #[test]
    fn test_decode_reports_invalid_document() {
        let result: Result<crate::models::Restaurant, _> = decode(json!({ "rating": "high" }));
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }
}
