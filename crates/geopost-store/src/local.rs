use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectAttrs, ObjectStore};

/// Filesystem [`ObjectStore`] for local development and tests.
///
/// New objects land in `{root}/private/{name}`. Granting public read moves the
/// file to `{root}/public/{name}`, which the server exposes under
/// `{public_base_url}/media/`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub async fn new(root: PathBuf, public_base_url: impl Into<String>) -> StoreResult<Self> {
        fs::create_dir_all(root.join("private")).await?;
        fs::create_dir_all(root.join("public")).await?;
        info!("Object storage directory: {}", root.display());
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Directory holding publicly readable objects.
    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    fn private_path(&self, name: &str) -> PathBuf {
        self.root.join("private").join(name)
    }

    fn public_path(&self, name: &str) -> PathBuf {
        self.public_dir().join(name)
    }

    fn media_link(&self, name: &str) -> String {
        format!("{}/media/{}", self.public_base_url, name)
    }
}

/// Object names become file names, so they must be a single plain path segment.
fn validate_name(name: &str) -> StoreResult<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::Internal(format!("invalid object name '{}'", name)))
    }
}

async fn exists(path: &Path) -> StoreResult<bool> {
    Ok(fs::try_exists(path).await?)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn check_bucket(&self) -> StoreResult<()> {
        for dir in [self.root.join("private"), self.public_dir()] {
            if !fs::metadata(&dir).await?.is_dir() {
                return Err(StoreError::NotFound(dir.display().to_string()));
            }
        }
        Ok(())
    }

    async fn put_object(
        &self,
        name: &str,
        _content_type: Option<&str>,
        data: Bytes,
    ) -> StoreResult<ObjectAttrs> {
        validate_name(name)?;

        let path = self.private_path(name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        info!("Image is saved to {}", path.display());
        Ok(ObjectAttrs {
            name: name.to_string(),
            size: data.len() as u64,
            media_link: self.media_link(name),
        })
    }

    async fn set_public_read(&self, name: &str) -> StoreResult<()> {
        validate_name(name)?;

        let private = self.private_path(name);
        if exists(&private).await? {
            fs::rename(&private, self.public_path(name)).await?;
            return Ok(());
        }
        if exists(&self.public_path(name)).await? {
            return Ok(());
        }
        Err(StoreError::NotFound(name.to_string()))
    }
}
