use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{StoreError, StoreResult, check_status};
use crate::object::{ObjectAttrs, ObjectStore};

const SERVICE: &str = "cloud-storage";

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// [`ObjectStore`] backed by the Cloud Storage JSON API.
pub struct GcsObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    access_token: Option<String>,
}

/// The subset of the object resource we read back.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    /// Cloud Storage sends int64 fields as strings.
    #[serde(default)]
    size: Option<String>,
    media_link: String,
}

impl GcsObjectStore {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_token,
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn check_bucket(&self) -> StoreResult<()> {
        let url = format!("{}/storage/v1/b/{}", self.endpoint, self.bucket);
        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        check_status(SERVICE, resp).await?;

        info!("Bucket '{}' is reachable", self.bucket);
        Ok(())
    }

    async fn put_object(
        &self,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> StoreResult<ObjectAttrs> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket);
        let resp = self
            .authorized(self.client.post(url))
            .query(&[("uploadType", "media"), ("name", name)])
            .header(
                header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(data)
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        let resp = check_status(SERVICE, resp).await?;

        let object: ObjectResource = resp
            .json()
            .await
            .map_err(|e| StoreError::decode("object resource", e))?;

        info!("Image is saved to Cloud Storage: {}", object.media_link);
        Ok(ObjectAttrs {
            size: object.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
            name: object.name,
            media_link: object.media_link,
        })
    }

    async fn set_public_read(&self, name: &str) -> StoreResult<()> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}/acl",
            self.endpoint, self.bucket, name
        );
        let resp = self
            .authorized(self.client.post(url))
            .json(&json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await
            .map_err(StoreError::http(SERVICE))?;
        check_status(SERVICE, resp).await?;
        Ok(())
    }
}
