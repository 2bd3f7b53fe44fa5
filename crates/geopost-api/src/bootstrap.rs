use serde_json::Value;
use tracing::info;

use geopost_store::{SearchIndex, StoreResult};

use crate::posts::{POST_INDEX, PostWriter};
use crate::users::{USER_INDEX, UserStore};

/// Create the `post` and `user` indices if they are missing.
pub async fn ensure_indices(index: &dyn SearchIndex) -> StoreResult<()> {
    ensure_index(index, POST_INDEX, &PostWriter::index_mapping()).await?;
    ensure_index(index, USER_INDEX, &UserStore::index_mapping()).await?;
    Ok(())
}

async fn ensure_index(index: &dyn SearchIndex, name: &str, mapping: &Value) -> StoreResult<()> {
    if index.index_exists(name).await? {
        info!("Index '{}' already exists", name);
        return Ok(());
    }
    index.create_index(name, mapping).await
}
