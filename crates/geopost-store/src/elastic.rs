use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult, check_status};
use crate::index::{Hit, Query, SearchHits, SearchIndex};

const SERVICE: &str = "elasticsearch";

/// Upper bound on hits per search. Matches the default `index.max_result_window`,
/// so a single request returns every match the index will hand out.
const MAX_HITS: usize = 10_000;

/// [`SearchIndex`] backed by the Elasticsearch REST API.
///
/// Targets Elasticsearch 7 and later: index mappings are typeless and
/// documents are written through the `_doc` endpoint.
pub struct ElasticIndex {
    client: Client,
    base_url: String,
}

impl ElasticIndex {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Elasticsearch at {}", base_url);
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    took: u64,
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: Total,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// An object by default; a bare number when the request or cluster sets `rest_total_hits_as_int`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn index_exists(&self, index: &str) -> StoreResult<bool> {
        let resp = self
            .client
            .head(self.url(index))
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;

        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => check_status(SERVICE, resp).await.map(|_| true),
        }
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()> {
        let resp = self
            .client
            .put(self.url(index))
            .json(mapping)
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        check_status(SERVICE, resp).await?;

        info!("Created index '{}'", index);
        Ok(())
    }

    async fn index_document(&self, index: &str, id: &str, body: &Value) -> StoreResult<()> {
        let resp = self
            .client
            .put(self.url(&format!("{}/_doc/{}", index, id)))
            .query(&[("refresh", "wait_for")])
            .json(body)
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        check_status(SERVICE, resp).await?;
        Ok(())
    }

    async fn search(&self, index: &str, query: &Query) -> StoreResult<SearchHits> {
        let resp = self
            .client
            .post(self.url(&format!("{}/_search", index)))
            .json(&json!({ "query": query.to_dsl(), "size": MAX_HITS }))
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        let resp = check_status(SERVICE, resp).await?;

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::decode("search response", e))?;

        debug!("Query on '{}' took {} milliseconds", index, body.took);

        let total = match body.hits.total {
            Total::Count(n) | Total::Object { value: n } => n,
        };
        Ok(SearchHits {
            total,
            took_ms: body.took,
            hits: body
                .hits
                .hits
                .into_iter()
                .map(|h| Hit {
                    id: h.id,
                    source: h.source,
                })
                .collect(),
        })
    }
}
