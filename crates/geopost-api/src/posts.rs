use std::sync::Arc;

use axum::{
    Extension,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use geopost_store::{AuditStore, Mutation, ObjectStore, SearchIndex};
use geopost_types::api::Claims;
use geopost_types::models::{Location, Post};

use crate::auth::AppState;
use crate::error::ApiError;

pub const POST_INDEX: &str = "post";
pub const POST_TABLE: &str = "post";

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct Image {
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Client-supplied fields of a new post. The author is never part of this;
/// it comes from the validated token.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub message: String,
    pub location: Location,
    pub image: Option<Image>,
}

/// Writes a post to all three stores: image first, then the search index,
/// then the audit table.
///
/// There is no compensation. An uploaded image stays if a later step fails,
/// and a post whose audit write fails stays in the search index.
#[derive(Clone)]
pub struct PostWriter {
    index: Arc<dyn SearchIndex>,
    objects: Arc<dyn ObjectStore>,
    audit: Arc<dyn AuditStore>,
}

impl PostWriter {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        objects: Arc<dyn ObjectStore>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            index,
            objects,
            audit,
        }
    }

    /// Settings for the `post` index: single shard, no replicas, `location` as a geo point.
    pub fn index_mapping() -> serde_json::Value {
        json!({
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 0
            },
            "mappings": {
                "properties": {
                    "location": { "type": "geo_point" }
                }
            }
        })
    }

    pub async fn create_post(&self, username: &str, draft: PostDraft) -> Result<Post, ApiError> {
        let id = Uuid::new_v4().to_string();

        let image = match draft.image {
            Some(image) if !image.data.is_empty() => image,
            _ => return Err(ApiError::bad_request("Image is not available")),
        };

        let attrs = self
            .objects
            .put_object(&id, image.content_type.as_deref(), image.data)
            .await
            .map_err(ApiError::upstream("Failed to save image to object store"))?;
        self.objects
            .set_public_read(&id)
            .await
            .map_err(ApiError::upstream("Failed to save image to object store"))?;
        info!("Image {} ({} bytes) is public", attrs.name, attrs.size);

        let post = Post {
            user: username.to_string(),
            message: draft.message,
            location: draft.location,
            url: attrs.media_link,
        };

        let body = serde_json::to_value(&post).map_err(|_| ApiError::Internal("Failed to encode post"))?;
        self.index
            .index_document(POST_INDEX, &id, &body)
            .await
            .map_err(ApiError::upstream("Failed to save post to search index"))?;
        info!("Post is saved to index: {}", post.message);

        self.audit
            .apply_mutation(POST_TABLE, &id, &audit_mutation(&post, now_millis_as_micros()))
            .await
            .map_err(ApiError::upstream("Failed to save post to audit store"))?;
        info!("Post is saved to audit store: {}", post.message);

        Ok(post)
    }
}

/// The audit row for a post: `post:{user,message}` and `location:{lat,lon}`.
pub fn audit_mutation(post: &Post, timestamp_micros: i64) -> Mutation {
    let mut m = Mutation::new();
    m.set("post", "user", timestamp_micros, post.user.as_str())
        .set("post", "message", timestamp_micros, post.message.as_str())
        .set("location", "lat", timestamp_micros, post.location.lat.to_string())
        .set("location", "lon", timestamp_micros, post.location.lon.to_string());
    m
}

/// Wide-column tables default to millisecond granularity, so drop the sub-ms part.
fn now_millis_as_micros() -> i64 {
    chrono::Utc::now().timestamp_millis() * 1000
}

/// Coordinates that do not parse as a finite number read as zero.
pub fn parse_coordinate(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// POST /post: multipart form with `lat`, `lon`, `message` and an `image` file.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    info!("Received one post request from {}", claims.username);

    let mut draft = PostDraft::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        ApiError::bad_request(e.body_text())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            warn!("Failed to read multipart field '{}': {}", name, e);
            ApiError::bad_request(e.body_text())
        })?;

        match name.as_str() {
            "lat" => draft.location.lat = parse_coordinate(&String::from_utf8_lossy(&data)),
            "lon" => draft.location.lon = parse_coordinate(&String::from_utf8_lossy(&data)),
            "message" => draft.message = String::from_utf8_lossy(&data).into_owned(),
            "image" => draft.image = Some(Image { content_type, data }),
            _ => {}
        }
    }

    state.posts.create_post(&claims.username, draft).await?;
    Ok(StatusCode::OK)
}
