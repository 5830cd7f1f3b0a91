//! Repository implementations for data access.
//!
//! Repositories implement the traits declared in `autobook_core::pipeline::ports`,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod pipeline;

pub use pipeline::PipelineRepository;
