use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use tracing::{debug, info, warn};

use geopost_store::{Distance, SearchIndex};
use geopost_types::api::{Claims, SearchQuery};
use geopost_types::models::Post;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::posts::{POST_INDEX, parse_coordinate};

/// Radius queries over the `post` index.
#[derive(Clone)]
pub struct GeoSearch {
    index: Arc<dyn SearchIndex>,
}

impl GeoSearch {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Every post within `distance` of (`lat`, `lon`), in index order.
    pub async fn search(&self, lat: f64, lon: f64, distance: Distance) -> Result<Vec<Post>, ApiError> {
        let query = geopost_store::Query::geo_distance("location", distance, lat, lon);
        let hits = self
            .index
            .search(POST_INDEX, &query)
            .await
            .map_err(ApiError::upstream("Failed to read post from search index"))?;
        debug!("{} posts within {} (took {} ms)", hits.total, distance, hits.took_ms);

        Ok(hits.decode::<Post>())
    }
}

/// GET /search?lat=..&lon=..&range=..; `range` is in kilometres, default 200.
pub async fn search_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let lat = parse_coordinate(query.lat.as_deref().unwrap_or_default());
    let lon = parse_coordinate(query.lon.as_deref().unwrap_or_default());

    let distance = match query.range.as_deref().filter(|r| !r.is_empty()) {
        None => Distance::DEFAULT,
        Some(raw) => {
            let km: f64 = raw.parse().map_err(|_| {
                warn!("Rejected search range '{}'", raw);
                ApiError::bad_request("Invalid range")
            })?;
            Distance::from_km(km).ok_or_else(|| ApiError::bad_request("Invalid range"))?
        }
    };

    info!(
        "Search by {} around ({}, {}) within {}",
        claims.username, lat, lon, distance
    );

    let posts = state.search.search(lat, lon, distance).await?;
    Ok(Json(posts))
}
