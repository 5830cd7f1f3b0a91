//! Quorum voting over the answers of an ensemble.
//!
//! The same vote serves every ensemble stage; only the required agreement
//! differs (unanimous for supplier resolution, strict majority for account
//! classification) and is always passed in by the caller.

pub mod vote;

#[cfg(test)]
mod vote_props;

pub use vote::{Consensus, vote};
