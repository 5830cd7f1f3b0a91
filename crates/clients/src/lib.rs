//! HTTP clients for the external services the pipeline calls.
//!
//! - [`GeminiClient`] implements [`TextGenerator`](autobook_core::pipeline::TextGenerator)
//! - [`DocumentAiClient`] implements [`DocumentExtractor`](autobook_core::pipeline::DocumentExtractor)
//!
//! Both are cheap to clone and safe to share between concurrent calls.

pub mod document_ai;
pub mod error;
pub mod gemini;
mod http;
pub mod service_account;

pub use document_ai::DocumentAiClient;
pub use error::ClientError;
pub use gemini::GeminiClient;
pub use service_account::{ServiceAccountKey, TokenProvider};
