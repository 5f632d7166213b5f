//! Object storage for post media.
//!
//! Backed by a GCS bucket in deployment, or a local directory when
//! LOCAL_STORAGE_PATH is set (development). All media keys are flat,
//! prefix-tagged names generated by the derivative pipeline.

use bytes::Bytes;
use std::path::PathBuf;

pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// Handle to the configured storage backend. Constructed once at startup and
/// shared through AppState.
#[derive(Clone)]
pub struct ObjectStore {
    gcs: Option<google_cloud_storage::client::Storage>,
    local_path: Option<PathBuf>,
    bucket: String,
}

impl ObjectStore {
    pub fn new(
        gcs: Option<google_cloud_storage::client::Storage>,
        local_path: Option<PathBuf>,
        bucket: &str,
    ) -> Self {
        Self {
            gcs,
            local_path,
            bucket: bucket.to_string(),
        }
    }

    /// Root of the local directory backend, when configured. The /media
    /// route serves files from under it.
    pub fn local_path(&self) -> Option<&PathBuf> {
        self.local_path.as_ref()
    }

    fn bucket_resource(&self) -> String {
        format!("projects/_/buckets/{}", self.bucket)
    }

    /// Upload a media object under the given key.
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if let Some(local_path) = &self.local_path {
            let full_path = local_path.join(key);
            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&full_path, data).await?;
        } else if let Some(gcs) = &self.gcs {
            let bytes = Bytes::copy_from_slice(data);
            gcs.write_object(&self.bucket_resource(), key, bytes)
                .send_buffered()
                .await?;
        } else {
            return Err("No storage backend configured (set LOCAL_STORAGE_PATH or GOOGLE_APPLICATION_CREDENTIALS)".into());
        }
        Ok(())
    }

    /// Download a media object by key.
    pub async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if let Some(local_path) = &self.local_path {
            let full_path = local_path.join(key);
            Ok(tokio::fs::read(&full_path).await?)
        } else if let Some(gcs) = &self.gcs {
            let mut resp = gcs.read_object(&self.bucket_resource(), key).send().await?;
            let mut data = Vec::new();
            while let Some(chunk) = resp.next().await {
                data.extend_from_slice(&chunk?);
            }
            Ok(data)
        } else {
            Err("No storage backend configured".into())
        }
    }

    /// Delete a single media object.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if let Some(local_path) = &self.local_path {
            let full_path = local_path.join(key);
            tokio::fs::remove_file(&full_path).await?;
        } else {
            let client = cloud_storage::Client::default();
            client.object().delete(&self.bucket, key).await?;
        }
        Ok(())
    }

    /// Best-effort batch delete for cascades (post delete, account delete).
    /// Individual failures are logged and counted, not propagated; a partial
    /// failure leaves the remaining keys orphaned in storage.
    pub async fn delete_many(&self, keys: &[String]) -> usize {
        let mut failed = 0;
        for key in keys {
            if let Err(e) = self.delete(key).await {
                eprintln!("[storage] Failed to delete object {}: {}", key, e);
                failed += 1;
            }
        }
        failed
    }

    /// Mint a time-boxed download URL for a media object. Local backend
    /// returns a path served by the API's own /media route; GCS mints a
    /// signed URL. Every call mints fresh, nothing is cached.
    pub async fn download_url(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError> {
        if self.local_path.is_some() {
            return Ok(format!("/media/{}", key));
        }

        let client = cloud_storage::Client::default();
        let object = client.object().read(&self.bucket, key).await?;
        let url = object.download_url(expiry_secs)?;
        Ok(url)
    }
}
