use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::audit::{AuditStore, Mutation};
use crate::error::{StoreError, StoreResult, check_status};

const SERVICE: &str = "bigtable";

pub const DEFAULT_ENDPOINT: &str = "https://bigtable.googleapis.com";

/// [`AuditStore`] backed by the Bigtable data API (`mutateRow` over REST).
pub struct BigtableAuditStore {
    client: Client,
    endpoint: String,
    project: String,
    instance: String,
    access_token: Option<String>,
}

impl BigtableAuditStore {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        project: impl Into<String>,
        instance: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        let store = Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project: project.into(),
            instance: instance.into(),
            access_token,
        };
        info!(
            "Bigtable instance projects/{}/instances/{}",
            store.project, store.instance
        );
        store
    }

    fn mutate_row_url(&self, table: &str) -> String {
        format!(
            "{}/v2/projects/{}/instances/{}/tables/{}:mutateRow",
            self.endpoint, self.project, self.instance, table
        )
    }
}

/// Request body for `mutateRow`. Bytes fields are base64, int64 fields are strings.
fn mutate_row_body(row_key: &str, mutation: &Mutation) -> Value {
    let mutations: Vec<Value> = mutation
        .cells()
        .iter()
        .map(|cell| {
            json!({
                "setCell": {
                    "familyName": cell.family,
                    "columnQualifier": B64.encode(cell.column.as_bytes()),
                    "timestampMicros": cell.timestamp_micros.to_string(),
                    "value": B64.encode(&cell.value),
                }
            })
        })
        .collect();

    json!({
        "rowKey": B64.encode(row_key.as_bytes()),
        "mutations": mutations,
    })
}

#[async_trait]
impl AuditStore for BigtableAuditStore {
    async fn apply_mutation(&self, table: &str, row_key: &str, mutation: &Mutation) -> StoreResult<()> {
        let mut req = self
            .client
            .post(self.mutate_row_url(table))
            .json(&mutate_row_body(row_key, mutation));
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(StoreError::http(SERVICE))?;
        check_status(SERVICE, resp).await?;
        Ok(())
    }
}
