//! Storage service implementation using Apache OpenDAL.

use opendal::{Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::pipeline::DocumentStore;

/// Read access to uploaded invoice documents.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Read a whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, the file is missing or too
    /// large, or the backend read fails.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let key = normalize_key(path)?;

        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        if meta.content_length() > self.config.max_file_size {
            return Err(StorageError::TooLarge {
                path: key.to_string(),
                size: meta.content_length(),
                max: self.config.max_file_size,
            });
        }

        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;

        debug!(key, bytes = buffer.len(), "read document");
        Ok(buffer.to_vec())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }
}

impl DocumentStore for StorageService {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.read(path).await
    }
}

/// Strip leading slashes and reject empty or parent-relative keys.
fn normalize_key(path: &str) -> Result<&str, StorageError> {
    let key = path.trim().trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(key)
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn temp_root(name: &str) -> std::path::PathBuf {
        let root = std::env::temp_dir().join(format!("autobook-storage-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&root).expect("create temp root");
        root
    }

    #[rstest]
    #[case("invoices/a.pdf", Some("invoices/a.pdf"))]
    #[case("/invoices/a.pdf", Some("invoices/a.pdf"))]
    #[case("  a.pdf ", Some("a.pdf"))]
    #[case("", None)]
    #[case("/", None)]
    #[case("../secrets.pdf", None)]
    #[case("a/../../b.pdf", None)]
    fn test_normalize_key(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_key(path).ok(), expected);
    }

    #[tokio::test]
    async fn test_read_local_document() {
        let root = temp_root("read");
        std::fs::create_dir_all(root.join("org")).expect("create dir");
        std::fs::write(root.join("org/invoice.pdf"), b"%PDF-1.5 test").expect("write file");

        let service = StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(&root)))
            .expect("should create service");

        assert_eq!(service.provider_name(), "local");
        let bytes = service.read("/org/invoice.pdf").await.expect("reads");
        assert_eq!(bytes, b"%PDF-1.5 test");
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let root = temp_root("missing");
        let service = StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(&root)))
            .expect("should create service");

        let err = service.read("nope.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { ref path } if path == "nope.pdf"));
    }

    #[tokio::test]
    async fn test_oversized_document_rejected() {
        let root = temp_root("oversized");
        std::fs::write(root.join("big.pdf"), vec![0u8; 64]).expect("write file");
        let config = StorageConfig::new(StorageProvider::local_fs(&root)).with_max_file_size(16);
        let service = StorageService::from_config(config).expect("should create service");

        let err = service.read("big.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { size: 64, max: 16, .. }));
    }
}
