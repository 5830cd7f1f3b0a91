//! Pipeline repository.
//!
//! One repository over a connection pool implements all three core
//! repository traits: queue, invoices and reference tables.

mod convert;
mod invoice;
mod queue;
mod reference;

use autobook_core::pipeline::RepositoryError;
use sea_orm::{DatabaseConnection, DbErr};

/// `SeaORM` implementation of the pipeline's persistence.
#[derive(Debug, Clone)]
pub struct PipelineRepository {
    db: DatabaseConnection,
}

impl PipelineRepository {
    /// Create a new pipeline repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(err: DbErr) -> RepositoryError {
    RepositoryError::new(err.to_string())
}
