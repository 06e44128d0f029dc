//! Chunked flushing of buffered teams into storage.

use async_trait::async_trait;
use std::sync::Arc;

use super::batch::split_into_chunks;
use crate::model::Team;
use crate::storage::Repo;

/// Persist a run of teams, reporting the ones that could not be written.
#[async_trait]
pub trait Flush: Send + Sync {
    /// Attempt to persist `teams`.
    ///
    /// Returns the teams that failed, in their original relative order.
    /// Storage errors are absorbed into the returned list.
    async fn flush(&self, teams: Vec<Team>) -> Vec<Team>;
}

#[async_trait]
impl<F: Flush + ?Sized> Flush for Arc<F> {
    async fn flush(&self, teams: Vec<Team>) -> Vec<Team> {
        (**self).flush(teams).await
    }
}

/// Flusher that writes fixed-size chunks through a [`Repo`].
///
/// Chunks are written strictly in order. A failed chunk is reported whole;
/// later chunks are still attempted.
#[derive(Debug, Clone)]
pub struct ChunkFlusher<R> {
    chunk_size: usize,
    repo: R,
}

impl<R: Repo> ChunkFlusher<R> {
    /// Create a flusher writing at most `chunk_size` teams per call.
    ///
    /// A `chunk_size` of zero produces no chunks, so nothing is written.
    pub fn new(chunk_size: usize, repo: R) -> Self {
        Self { chunk_size, repo }
    }
}

#[async_trait]
impl<R: Repo> Flush for ChunkFlusher<R> {
    async fn flush(&self, teams: Vec<Team>) -> Vec<Team> {
        let chunks = split_into_chunks(&teams, self.chunk_size);

        if chunks.is_empty() {
            if !teams.is_empty() {
                tracing::warn!(
                    dropped = teams.len(),
                    chunk_size = self.chunk_size,
                    "Chunk size is zero, nothing written"
                );
            }
            return Vec::new();
        }

        let mut failed = Vec::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            match self.repo.add_teams(chunk).await {
                Ok(ids) => {
                    tracing::debug!(chunk = index, written = ids.len(), "Chunk persisted");
                }
                Err(e) => {
                    tracing::warn!(
                        chunk = index,
                        size = chunk.len(),
                        error = %e,
                        "Chunk write failed, keeping for retry"
                    );
                    failed.extend_from_slice(chunk);
                }
            }
        }

        failed
    }
}
