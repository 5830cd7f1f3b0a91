//! PDF preparation before text extraction.

mod error;
mod pages;

pub use error::DocumentError;
pub use pages::{CappedDocument, cap_pages};
