//! Object storage for record attachments
//!
//! Buckets are per-domain and auto-created on first use. Objects are
//! stored at `{accountId}/{randomName}.{ext}` so concurrent uploads never
//! collide, and exposed through public URLs derived from a configured
//! base.

use anyhow::Result;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{info, warn};
use uuid::Uuid;

/// Length of the random object-name stem
const OBJECT_NAME_LEN: usize = 16;

/// S3-backed attachment store
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    /// Base URL under which buckets are publicly reachable,
    /// e.g. "https://storage.example.com"
    public_url_base: String,
}

impl ObjectStore {
    pub fn new(client: Client, public_url_base: String) -> Self {
        Self {
            client,
            public_url_base: public_url_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a new ObjectStore from environment variables and the ambient
    /// AWS configuration
    ///
    /// # Environment Variables
    /// - `S3_PUBLIC_URL`: Public base URL for stored objects
    ///   (default: "http://localhost:9000")
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let public_url_base =
            std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:9000".to_string());
        Self::new(client, public_url_base)
    }

    /// Build the object key for an upload: `{accountId}/{random}.{ext}`
    pub fn object_key(account_id: Uuid, file_name: &str) -> String {
        let stem: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OBJECT_NAME_LEN)
            .map(char::from)
            .collect();

        match file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("{}/{}.{}", account_id, stem, ext),
            _ => format!("{}/{}", account_id, stem),
        }
    }

    /// Ensure the bucket exists, creating it on first use
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        info!("Creating storage bucket: {}", bucket);
        self.client.create_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    /// Upload a file and return its public URL
    pub async fn store(
        &self,
        bucket: &str,
        account_id: Uuid,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        self.ensure_bucket(bucket).await?;

        let key = Self::object_key(account_id, file_name);
        self.client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(format!("{}/{}/{}", self.public_url_base, bucket, key))
    }

    /// Delete the object behind a public URL. Best-effort: unparseable or
    /// foreign URLs are logged and skipped.
    pub async fn remove_by_url(&self, url: &str) {
        let Some((bucket, key)) = self.parse_public_url(url) else {
            warn!("Skipping storage cleanup for unrecognized URL: {}", url);
            return;
        };

        if let Err(e) = self
            .client
            .delete_object()
            .bucket(&bucket)
            .key(&key)
            .send()
            .await
        {
            warn!("Failed to delete storage object {}/{}: {}", bucket, key, e);
        }
    }

    /// Split a public URL back into (bucket, key)
    fn parse_public_url(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(&self.public_url_base)?.trim_start_matches('/');
        let (bucket, key) = rest.split_once('/')?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some((bucket.to_string(), key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_shape() {
        let account_id = Uuid::new_v4();
        let key = ObjectStore::object_key(account_id, "statement.pdf");

        let (prefix, name) = key.split_once('/').expect("key has an account prefix");
        assert_eq!(prefix, account_id.to_string());
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), OBJECT_NAME_LEN + ".pdf".len());
    }

    #[test]
    fn test_object_key_without_extension() {
        let account_id = Uuid::new_v4();
        let key = ObjectStore::object_key(account_id, "README");
        let (_, name) = key.split_once('/').unwrap();
        assert_eq!(name.len(), OBJECT_NAME_LEN);
    }

    #[test]
    fn test_object_keys_do_not_collide() {
        let account_id = Uuid::new_v4();
        let a = ObjectStore::object_key(account_id, "doc.pdf");
        let b = ObjectStore::object_key(account_id, "doc.pdf");
        assert_ne!(a, b);
    }
}
