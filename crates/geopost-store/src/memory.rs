use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::geo::haversine_km;
use crate::index::{Hit, Query, SearchHits, SearchIndex};

/// In-process [`SearchIndex`] for local development and tests.
///
/// Documents keep insertion order; re-indexing an id replaces the document in
/// place. Writes are immediately visible. Like Elasticsearch, writing to a
/// missing index creates it, and searching a missing index is an error.
#[derive(Default)]
pub struct MemoryIndex {
    indices: Mutex<HashMap<String, IndexData>>,
}

#[derive(Default)]
struct IndexData {
    mapping: Value,
    docs: Vec<(String, Value)>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_indices<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut HashMap<String, IndexData>) -> StoreResult<T>,
    {
        let mut indices = self
            .indices
            .lock()
            .map_err(|e| StoreError::Internal(format!("Index lock poisoned: {}", e)))?;
        f(&mut indices)
    }

    /// Mapping the index was created with, if it exists.
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.with_indices(|indices| Ok(indices.get(index).map(|d| d.mapping.clone())))
            .ok()
            .flatten()
    }
}

fn matches(query: &Query, doc: &Value) -> bool {
    match query {
        Query::Term { field, value } => doc.get(field).and_then(Value::as_str) == Some(value.as_str()),
        Query::GeoDistance {
            field,
            distance,
            lat,
            lon,
        } => {
            let Some(point) = doc.get(field) else {
                return false;
            };
            match (
                point.get("lat").and_then(Value::as_f64),
                point.get("lon").and_then(Value::as_f64),
            ) {
                (Some(p_lat), Some(p_lon)) => haversine_km(*lat, *lon, p_lat, p_lon) <= distance.km(),
                _ => false,
            }
        }
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_exists(&self, index: &str) -> StoreResult<bool> {
        self.with_indices(|indices| Ok(indices.contains_key(index)))
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()> {
        self.with_indices(|indices| {
            if indices.contains_key(index) {
                return Err(StoreError::Status {
                    service: "memory-index",
                    status: 400,
                    body: format!("index '{}' already exists", index),
                });
            }
            indices.insert(
                index.to_string(),
                IndexData {
                    mapping: mapping.clone(),
                    docs: Vec::new(),
                },
            );
            Ok(())
        })?;

        info!("Created in-memory index '{}'", index);
        Ok(())
    }

    async fn index_document(&self, index: &str, id: &str, body: &Value) -> StoreResult<()> {
        self.with_indices(|indices| {
            let data = indices.entry(index.to_string()).or_default();
            match data.docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
                Some((_, doc)) => *doc = body.clone(),
                None => data.docs.push((id.to_string(), body.clone())),
            }
            Ok(())
        })
    }

    async fn search(&self, index: &str, query: &Query) -> StoreResult<SearchHits> {
        self.with_indices(|indices| {
            let data = indices.get(index).ok_or_else(|| StoreError::Status {
                service: "memory-index",
                status: 404,
                body: format!("no such index [{}]", index),
            })?;

            let hits: Vec<Hit> = data
                .docs
                .iter()
                .filter(|(_, doc)| matches(query, doc))
                .map(|(id, doc)| Hit {
                    id: id.clone(),
                    source: doc.clone(),
                })
                .collect();

            Ok(SearchHits {
                total: hits.len() as u64,
                took_ms: 0,
                hits,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::geo::Distance;

    fn post_at(lat: f64, lon: f64) -> Value {
        json!({ "user": "u", "message": "m", "location": { "lat": lat, "lon": lon }, "url": "" })
    }

    #[tokio::test]
    async fn create_then_exists() {
        let idx = MemoryIndex::new();
        assert!(!idx.index_exists("post").await.unwrap());
        idx.create_index("post", &json!({ "settings": {} })).await.unwrap();
        assert!(idx.index_exists("post").await.unwrap());
        assert_eq!(idx.mapping("post"), Some(json!({ "settings": {} })));
        assert!(idx.create_index("post", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn search_on_missing_index_fails() {
        let idx = MemoryIndex::new();
        let err = idx.search("nope", &Query::term("a", "b")).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn term_query_matches_exactly() {
        let idx = MemoryIndex::new();
        idx.index_document("user", "alice", &json!({ "username": "alice" })).await.unwrap();
        idx.index_document("user", "alicia", &json!({ "username": "alicia" })).await.unwrap();

        let hits = idx.search("user", &Query::term("username", "alice")).await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].id, "alice");
    }

    #[tokio::test]
    async fn reindexing_replaces_document() {
        let idx = MemoryIndex::new();
        idx.index_document("user", "bob", &json!({ "username": "bob", "age": 1 })).await.unwrap();
        idx.index_document("user", "bob", &json!({ "username": "bob", "age": 2 })).await.unwrap();

        let hits = idx.search("user", &Query::term("username", "bob")).await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].source["age"], 2);
    }

    #[tokio::test]
    async fn geo_distance_filters_by_radius() {
        let idx = MemoryIndex::new();
        idx.index_document("post", "near", &post_at(37.71, -122.41)).await.unwrap();
        // ~50 km south
        idx.index_document("post", "far", &post_at(37.25, -122.4)).await.unwrap();

        let five_km = Distance::from_km(5.0).unwrap();
        let hits = idx
            .search("post", &Query::geo_distance("location", five_km, 37.7, -122.4))
            .await
            .unwrap();
        let ids: Vec<_> = hits.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);

        let hits = idx
            .search("post", &Query::geo_distance("location", Distance::DEFAULT, 37.7, -122.4))
            .await
            .unwrap();
        assert_eq!(hits.total, 2);
    }
}
