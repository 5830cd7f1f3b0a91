//! Storage configuration types.

use std::path::PathBuf;

use autobook_shared::StorageSettings;

/// Storage provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket name (or root directory).
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

impl From<StorageSettings> for StorageProvider {
    fn from(settings: StorageSettings) -> Self {
        match settings {
            StorageSettings::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => Self::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            },
            StorageSettings::LocalFs { root } => Self::LocalFs { root },
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Largest document that will be downloaded, in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max file size: 25MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}

impl From<StorageSettings> for StorageConfig {
    fn from(settings: StorageSettings) -> Self {
        Self::new(settings.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_s3_settings() {
        let provider = StorageProvider::from(StorageSettings::S3 {
            endpoint: "https://project.supabase.co/storage/v1/s3".to_string(),
            bucket: "invoices".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            region: "auto".to_string(),
        });
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "invoices");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::from(StorageSettings::LocalFs {
            root: "./invoices".into(),
        });
        assert_eq!(config.provider.name(), "local");
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
    }
}
