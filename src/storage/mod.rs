//! Storage layer for teams.
//!
//! Provides:
//! - The bulk-write capability consumed by the flusher
//! - Schema initialization and pragmas
//! - A pooled SQLite store implementing it

pub mod schema;
pub mod store;

pub use store::TeamStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::model::Team;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Failed to get pooled connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Team not found: {0}")]
    NotFound(u64),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Bulk-write capability for teams.
///
/// An error means none of the batch was persisted.
#[async_trait]
pub trait Repo: Send + Sync {
    /// Persist `teams` as one unit, returning the assigned ids in order.
    async fn add_teams(&self, teams: &[Team]) -> Result<Vec<u64>, RepoError>;
}

#[async_trait]
impl<R: Repo + ?Sized> Repo for Arc<R> {
    async fn add_teams(&self, teams: &[Team]) -> Result<Vec<u64>, RepoError> {
        (**self).add_teams(teams).await
    }
}
