//! Synchronous team operations.
//!
//! Writes go straight to the store, bypassing the saver, and publish an
//! event once persisted. Bulk creation is chunked like a flush but stops at
//! the first failing chunk.

use thiserror::Error;

use crate::events::{EventBus, EventKind};
use crate::model::{NewTeam, SearchType, Team, ValidationError};
use crate::pipeline::split_into_chunks;
use crate::storage::{Repo, RepoError, TeamStore};

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] RepoError),

    #[error("bulk create stopped after {} teams: {source}", .created.len())]
    PartialCreate {
        /// Ids of the teams written before the failure
        created: Vec<u64>,
        #[source]
        source: RepoError,
    },
}

impl ServiceError {
    /// Whether the error is a missing (or deleted) team.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(RepoError::NotFound(_)))
    }
}

/// Team operations over a store and an event bus.
#[derive(Clone)]
pub struct TeamService {
    store: TeamStore,
    events: EventBus,
    batch_size: usize,
}

impl TeamService {
    /// Create a service writing bulk requests `batch_size` teams at a time.
    ///
    /// A batch size of zero is treated as one.
    pub fn new(store: TeamStore, events: EventBus, batch_size: usize) -> Self {
        Self {
            store,
            events,
            batch_size: batch_size.max(1),
        }
    }

    /// Get the event bus changes are published on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Validate and persist one team, returning its id.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_team(&self, new: NewTeam) -> Result<u64, ServiceError> {
        let team = Team::from(new);
        team.validate()?;

        let id = self.store.create_team(&team).await?;
        self.events.notify(id, EventKind::Created);

        tracing::debug!(id, "Team created");
        Ok(id)
    }

    /// Validate every team, then persist them chunk by chunk.
    ///
    /// Returns the ids in input order. On a storage failure the ids written
    /// so far are carried in [`ServiceError::PartialCreate`].
    #[tracing::instrument(skip(self, teams), fields(count = teams.len()))]
    pub async fn multi_create_teams(
        &self,
        teams: Vec<NewTeam>,
    ) -> Result<Vec<u64>, ServiceError> {
        let teams: Vec<Team> = teams.into_iter().map(Team::from).collect();
        for team in &teams {
            team.validate()?;
        }

        let mut created = Vec::with_capacity(teams.len());

        for (index, chunk) in split_into_chunks(&teams, self.batch_size)
            .into_iter()
            .enumerate()
        {
            match self.store.add_teams(chunk).await {
                Ok(ids) => {
                    tracing::debug!(batch = index, size = chunk.len(), "Team batch created");
                    created.extend(ids);
                }
                Err(source) => {
                    tracing::warn!(batch = index, error = %source, "Team batch failed");
                    return Err(ServiceError::PartialCreate { created, source });
                }
            }
        }

        Ok(created)
    }

    /// Fetch a live team.
    pub async fn get_team(&self, id: u64) -> Result<Team, ServiceError> {
        Ok(self.store.get_team(id).await?)
    }

    /// List live teams with their total count.
    pub async fn list_teams(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Team>, u64), ServiceError> {
        Ok(self.store.list_teams(limit, offset).await?)
    }

    /// Search live teams by name and description.
    pub async fn search_teams(
        &self,
        query: &str,
        search_type: SearchType,
    ) -> Result<Vec<Team>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        Ok(self.store.search_teams(query, search_type).await?)
    }

    /// Replace name and description of a live team.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_team(&self, id: u64, changes: NewTeam) -> Result<(), ServiceError> {
        let team = Team {
            id,
            ..Team::from(changes)
        };
        team.validate()?;

        self.store.update_team(&team).await?;
        self.events.notify(id, EventKind::Updated);

        tracing::debug!("Team updated");
        Ok(())
    }

    /// Soft-delete a live team.
    #[tracing::instrument(skip(self))]
    pub async fn remove_team(&self, id: u64) -> Result<(), ServiceError> {
        self.store.remove_team(id).await?;
        self.events.notify(id, EventKind::Removed);

        tracing::debug!("Team removed");
        Ok(())
    }
}
