//! Buffered saver with a single owning task.
//!
//! Producers hand teams to the owning task through a bounded channel and
//! wait for an acknowledgement, so a successful [`Saver::save`] means the
//! team sits in the pending buffer. The task is the only writer of that
//! buffer and flushes it when:
//! - the buffer reaches capacity (synchronously, before the next event)
//! - the flush interval ticks (even when empty)
//! - shutdown is requested (one final flush, then terminal state)
//!
//! Teams a flush could not persist stay buffered and are retried on the
//! next trigger.

use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::batch::PendingBuffer;
use super::flusher::Flush;
use crate::model::Team;

/// Configuration for a saver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaverConfig {
    /// Buffer length that triggers an immediate flush
    pub capacity: usize,
    /// Period of the timer-driven flush
    pub flush_interval: Duration,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            flush_interval: Duration::from_secs(1),
        }
    }
}

impl SaverConfig {
    /// Create a SaverConfig from application config values.
    pub fn from_config(capacity: usize, flush_interval_ms: u64) -> Self {
        Self {
            capacity,
            flush_interval: Duration::from_millis(flush_interval_ms),
        }
    }

    /// Reject configurations that cannot drive a saver.
    pub fn validate(&self) -> Result<(), SaverError> {
        if self.capacity == 0 {
            return Err(SaverError::ZeroCapacity);
        }
        if self.flush_interval.is_zero() {
            return Err(SaverError::ZeroInterval);
        }
        Ok(())
    }
}

/// Error type for saver operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SaverError {
    #[error("saver capacity must be greater than zero")]
    ZeroCapacity,

    #[error("saver flush interval must be greater than zero")]
    ZeroInterval,

    #[error("saver must be created inside a tokio runtime")]
    NoRuntime,

    #[error("cannot save to a closed saver")]
    Closed,
}

/// Lifecycle state of a saver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaverState {
    /// Accepting teams, timer running
    Initialized,
    /// Terminal: final flush done, saves rejected
    Closed,
}

enum Command {
    Save {
        team: Team,
        accepted: oneshot::Sender<()>,
    },
    Close {
        done: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Capacity,
    Interval,
    Shutdown,
}

/// Handle to a running saver.
///
/// Clones share one owning task. Dropping every handle without calling
/// [`Saver::close`] still performs the final flush.
#[derive(Debug, Clone)]
pub struct Saver {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SaverState>,
}

impl Saver {
    /// Validate `config` and spawn the owning task on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns an error, without spawning anything, if capacity or interval
    /// is zero or no tokio runtime is available.
    pub fn new<F>(config: SaverConfig, flusher: F) -> Result<Self, SaverError>
    where
        F: Flush + 'static,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SaverError::NoRuntime)?;

        // Capacity 1 plus the acknowledgement makes each save a rendezvous.
        let (commands_tx, commands_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(SaverState::Initialized);

        let mut ticker = time::interval_at(
            Instant::now() + config.flush_interval,
            config.flush_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task = SaverTask {
            flusher,
            buffer: PendingBuffer::new(config.capacity),
            commands: commands_rx,
            state: state_tx,
        };
        runtime.spawn(task.run(ticker));

        tracing::debug!(
            capacity = config.capacity,
            interval_ms = config.flush_interval.as_millis() as u64,
            "Saver started"
        );

        Ok(Self {
            commands: commands_tx,
            state: state_rx,
        })
    }

    /// Hand a team to the owning task.
    ///
    /// Resolves once the team is buffered. `Ok` means queued, not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SaverError::Closed`] if the saver has shut down or shuts
    /// down before accepting the team.
    pub async fn save(&self, team: Team) -> Result<(), SaverError> {
        let (accepted_tx, accepted_rx) = oneshot::channel();

        self.commands
            .send(Command::Save {
                team,
                accepted: accepted_tx,
            })
            .await
            .map_err(|_| SaverError::Closed)?;

        accepted_rx.await.map_err(|_| SaverError::Closed)
    }

    /// Stop accepting teams, flush what remains and enter the closed state.
    ///
    /// Every call returns only after the final flush has ended, including
    /// calls that overlap a close already in progress. Teams that still fail
    /// in the final flush are logged, not returned.
    pub async fn close(&self) {
        if self.state() == SaverState::Closed {
            return;
        }

        let (done_tx, done_rx) = oneshot::channel();
        let sent = self
            .commands
            .send(Command::Close { done: done_tx })
            .await
            .is_ok();
        if sent && done_rx.await.is_ok() {
            return;
        }

        // Another close is running the final flush.
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == SaverState::Closed).await;
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> SaverState {
        *self.state.borrow()
    }
}

/// The owning task: sole mutator of the pending buffer.
struct SaverTask<F> {
    flusher: F,
    buffer: PendingBuffer<Team>,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<SaverState>,
}

impl<F: Flush> SaverTask<F> {
    async fn run(mut self, mut ticker: Interval) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Save { team, accepted }) => {
                        let full = self.buffer.push(team);
                        // The team is buffered even if the caller stopped waiting.
                        let _ = accepted.send(());
                        if full {
                            self.flush(Trigger::Capacity).await;
                        }
                    }
                    Some(Command::Close { done }) => {
                        self.shutdown().await;
                        let _ = done.send(());
                        return;
                    }
                    None => {
                        tracing::debug!("All saver handles dropped");
                        self.shutdown().await;
                        return;
                    }
                },
                _ = ticker.tick() => {
                    self.flush(Trigger::Interval).await;
                }
            }
        }
    }

    async fn flush(&mut self, trigger: Trigger) {
        let pending = self.buffer.take();
        let pending_len = pending.len();

        tracing::debug!(?trigger, pending = pending_len, "Flushing saver buffer");

        let failed = self.flusher.flush(pending).await;
        if !failed.is_empty() {
            tracing::warn!(
                ?trigger,
                failed = failed.len(),
                pending = pending_len,
                "Flush incomplete, retaining failed teams"
            );
        }
        self.buffer.restore(failed);
    }

    async fn shutdown(&mut self) {
        // New saves fail fast; ones already queued are dropped unacknowledged.
        self.commands.close();

        self.flush(Trigger::Shutdown).await;

        if !self.buffer.is_empty() {
            tracing::warn!(
                unsaved = self.buffer.len(),
                "Saver closed with unpersisted teams"
            );
        }

        self.state.send_replace(SaverState::Closed);
        tracing::debug!("Saver closed");
    }
}
