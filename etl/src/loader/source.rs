use crate::storage::split_s3_location;
use bytes::Bytes;
use common::{Error, Result};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// A bulk-load source: an `s3://` prefix or a local directory, or a single object in either.
pub struct SourceLocation {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
    display: String,
}

impl SourceLocation {
    /// S3 locations use the ambient AWS credentials of the process.
    pub fn resolve(location: &str, region: &str) -> Result<Self> {
        if let Some((bucket, key)) = split_s3_location(location) {
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region)
                .build()?;

            return Ok(Self {
                store: Arc::new(store),
                prefix: Path::from(key),
                display: location.to_string(),
            });
        }

        let local = location.strip_prefix("file://").unwrap_or(location);
        let prefix = Path::from_filesystem_path(local)
            .map_err(|e| Error::InvalidInput(format!("Source {} is not readable: {}", location, e)))?;

        Ok(Self {
            store: Arc::new(LocalFileSystem::new()),
            prefix,
            display: location.to_string(),
        })
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// JSON objects under the location, in key order.
    ///
    /// A location naming a single object yields that object. Objects without a `.json`
    /// suffix are skipped.
    pub async fn list_files(&self) -> Result<Vec<ObjectMeta>> {
        let mut objects: Vec<ObjectMeta> = self.store.list(Some(&self.prefix)).try_collect().await?;

        if objects.is_empty() {
            match self.store.head(&self.prefix).await {
                Ok(meta) => objects.push(meta),
                Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        objects.sort_by(|a, b| a.location.cmp(&b.location));

        let (json, skipped): (Vec<_>, Vec<_>) = objects
            .into_iter()
            .partition(|meta| meta.location.as_ref().ends_with(".json"));
        for meta in &skipped {
            warn!("Skipping {} under {}: not a .json file", meta.location, self.display);
        }

        debug!("Found {} JSON files under {}", json.len(), self.display);
        Ok(json)
    }

    pub async fn read(&self, meta: &ObjectMeta) -> Result<Bytes> {
        Ok(self.store.get(&meta.location).await?.bytes().await?)
    }

    /// Contents of the location itself, for sources that name one object.
    pub async fn read_object(&self) -> Result<Bytes> {
        Ok(self.store.get(&self.prefix).await?.bytes().await?)
    }
}
