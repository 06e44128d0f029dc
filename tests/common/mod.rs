//! Test utilities for Team Saver tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - Recording doubles for the repo and flusher
//! - Team builders

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use team_saver::storage::TeamStore;
use team_saver::{Flush, Repo, RepoError, Team};

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Open a store on the fixture database.
    pub fn store(&self) -> TeamStore {
        TeamStore::open(&self.db_path, 2).expect("failed to open store")
    }

    /// Make every insert of a team called `name` fail.
    ///
    /// The store must have been opened first so the table exists.
    pub fn reject_inserts_named(&self, name: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).expect("failed to open database");
        conn.execute_batch(&format!(
            "CREATE TRIGGER reject_{name} BEFORE INSERT ON teams \
             WHEN NEW.name = '{name}' \
             BEGIN SELECT RAISE(ABORT, 'insert rejected'); END;"
        ))
        .expect("failed to create trigger");
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Team with a recognizable id, as if already known to the caller.
pub fn team(n: u64) -> Team {
    Team {
        id: n,
        ..Team::new(format!("Team{n}"), format!("Desc{n}"))
    }
}

/// Teams numbered `1..=n`.
pub fn teams(n: u64) -> Vec<Team> {
    (1..=n).map(team).collect()
}

/// Ids of `teams`, in order.
pub fn ids(teams: &[Team]) -> Vec<u64> {
    teams.iter().map(|t| t.id).collect()
}

/// How a [`RecordingRepo`] answers each call.
pub enum Script {
    /// Every call succeeds
    AlwaysOk,
    /// Every call fails
    AlwaysFail,
    /// Calls with these zero-based indexes fail
    FailCalls(HashSet<usize>),
}

/// Repo double recording every batch it receives.
pub struct RecordingRepo {
    script: Mutex<Script>,
    calls: Mutex<Vec<Vec<Team>>>,
}

impl RecordingRepo {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Script::AlwaysOk)
    }

    pub fn failing() -> Self {
        Self::new(Script::AlwaysFail)
    }

    pub fn failing_calls(indexes: impl IntoIterator<Item = usize>) -> Self {
        Self::new(Script::FailCalls(indexes.into_iter().collect()))
    }

    /// Change how later calls are answered.
    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// Batches received so far.
    pub fn calls(&self) -> Vec<Vec<Team>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Repo for RecordingRepo {
    async fn add_teams(&self, teams: &[Team]) -> Result<Vec<u64>, RepoError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(teams.to_vec());
            calls.len() - 1
        };

        let fail = match &*self.script.lock().unwrap() {
            Script::AlwaysOk => false,
            Script::AlwaysFail => true,
            Script::FailCalls(indexes) => indexes.contains(&index),
        };

        if fail {
            return Err(RepoError::Unavailable(format!("scripted failure on call {index}")));
        }
        Ok(ids(teams))
    }
}

/// Flusher double recording every flush and persisting everything.
#[derive(Default)]
pub struct RecordingFlusher {
    flushes: Mutex<Vec<Vec<Team>>>,
    delay: Duration,
}

impl RecordingFlusher {
    /// Flusher that takes `delay` to finish each flush.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Inputs of every flush so far.
    pub fn flushes(&self) -> Vec<Vec<Team>> {
        self.flushes.lock().unwrap().clone()
    }

    /// Ids of every team flushed so far, in flush order.
    pub fn flushed_ids(&self) -> Vec<u64> {
        self.flushes().iter().flat_map(|f| ids(f)).collect()
    }
}

#[async_trait]
impl Flush for RecordingFlusher {
    async fn flush(&self, teams: Vec<Team>) -> Vec<Team> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.flushes.lock().unwrap().push(teams);
        Vec::new()
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
