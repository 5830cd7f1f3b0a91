//! Invoice document storage using Apache OpenDAL.
//!
//! The pipeline only reads: uploaded invoices are fetched by their stored
//! path, relative to the bucket (or root directory).
//!
//! - S3-compatible: Supabase Storage, Cloudflare R2, AWS S3
//! - Local filesystem (development only)

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
