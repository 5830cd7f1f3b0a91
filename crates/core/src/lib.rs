//! Core business logic for Autobook.
//!
//! This crate contains pure pipeline logic with ZERO web or database dependencies.
//! Persistence and the external services are reached through traits declared in
//! [`pipeline::ports`] and implemented elsewhere.
//!
//! # Modules
//!
//! - `consensus` - Quorum vote over ensemble answers
//! - `vat` - Reconciliation of VAT lines against the payable amount
//! - `resolver` - Token to reference-table ID resolution
//! - `prompt` - Prompt assembly per stage
//! - `reply` - Parsing of model replies
//! - `document` - PDF page capping before extraction
//! - `storage` - Document storage (OpenDAL)
//! - `pipeline` - Stage handlers, dispatcher and the pipeline facade

pub mod consensus;
pub mod document;
pub mod pipeline;
pub mod prompt;
pub mod reply;
pub mod resolver;
pub mod storage;
pub mod vat;
