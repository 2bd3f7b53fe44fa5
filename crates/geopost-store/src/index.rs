//! Searchable document index.
//!
//! Documents are JSON bodies keyed by id inside a named index. The entity
//! adapters above this layer decode hits into their own record types with
//! [`SearchHits::decode`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::warn;

use crate::error::StoreResult;
use crate::geo::Distance;

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Exact match of a keyword field.
    Term { field: String, value: String },
    /// Documents whose geo point lies within `distance` of (`lat`, `lon`).
    GeoDistance {
        field: String,
        distance: Distance,
        lat: f64,
        lon: f64,
    },
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn geo_distance(field: impl Into<String>, distance: Distance, lat: f64, lon: f64) -> Self {
        Self::GeoDistance {
            field: field.into(),
            distance,
            lat,
            lon,
        }
    }

    /// Elasticsearch query DSL for this query.
    pub fn to_dsl(&self) -> Value {
        match self {
            Self::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Self::GeoDistance {
                field,
                distance,
                lat,
                lon,
            } => json!({
                "geo_distance": {
                    "distance": distance.to_string(),
                    field.as_str(): { "lat": lat, "lon": lon }
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub took_ms: u64,
    pub hits: Vec<Hit>,
}

impl SearchHits {
    /// Decode every hit's source as `T`. Hits that do not fit are logged and skipped.
    pub fn decode<T: DeserializeOwned>(self) -> Vec<T> {
        self.hits
            .into_iter()
            .filter_map(|hit| match serde_json::from_value::<T>(hit.source) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("Skipping undecodable document '{}': {}", hit.id, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index_exists(&self, index: &str) -> StoreResult<bool>;

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()>;

    /// Write (or replace) a document. The document is visible to searches
    /// once this returns.
    async fn index_document(&self, index: &str, id: &str, body: &Value) -> StoreResult<()>;

    /// All documents matching `query`, in the order the index returns them.
    async fn search(&self, index: &str, query: &Query) -> StoreResult<SearchHits>;
}
