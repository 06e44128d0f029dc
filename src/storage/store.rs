//! Pooled SQLite store for teams.
//!
//! Uses r2d2 with r2d2_sqlite for pooled access. Blocking SQLite calls run
//! on tokio's blocking pool so async callers are never stalled.

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

use super::schema::{apply_pragmas, initialize_schema};
use super::{Repo, RepoError};
use crate::model::{SearchType, Team};

const TEAM_SELECT_SQL: &str = "SELECT id, name, description, is_deleted FROM teams";

/// SQLite-backed team storage.
///
/// Deleted teams are kept as tombstones and hidden from every read and
/// mutation.
#[derive(Clone)]
pub struct TeamStore {
    pool: Pool<SqliteConnectionManager>,
}

impl TeamStore {
    /// Open (or create) the store at `db_path`.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or the schema cannot
    /// be applied.
    pub fn open<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, RepoError> {
        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(StoreConnectionCustomizer))
            .build(manager)?;

        let conn = pool.get()?;
        initialize_schema(&conn)?;

        Ok(Self { pool })
    }

    /// Insert a single team, returning its id.
    pub async fn create_team(&self, team: &Team) -> Result<u64, RepoError> {
        let team = team.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO teams (name, description, is_deleted) VALUES (?1, ?2, ?3)",
                params![team.name, team.description, team.is_deleted],
            )?;
            Ok(conn.last_insert_rowid() as u64)
        })
        .await
    }

    /// Fetch a live team by id.
    pub async fn get_team(&self, id: u64) -> Result<Team, RepoError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{TEAM_SELECT_SQL} WHERE id = ?1 AND is_deleted = 0"),
                params![id as i64],
                team_from_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))
        })
        .await
    }

    /// List live teams ordered by id.
    ///
    /// Returns the requested page and the total number of live teams.
    pub async fn list_teams(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Team>, u64), RepoError> {
        self.with_conn(move |conn| {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM teams WHERE is_deleted = 0", [], |row| {
                    row.get(0)
                })?;

            let mut stmt = conn.prepare(&format!(
                "{TEAM_SELECT_SQL} WHERE is_deleted = 0 ORDER BY id ASC LIMIT ?1 OFFSET ?2"
            ))?;
            let teams = stmt
                .query_map(
                    params![clamp_to_sql(limit), clamp_to_sql(offset)],
                    team_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((teams, total as u64))
        })
        .await
    }

    /// Find live teams whose name or description matches `query`, ordered by id.
    ///
    /// `Plain` requires every word of the query to appear somewhere in the
    /// team's text. `Phrase` requires the words to appear together, in
    /// order. Matching ignores ASCII case. A query with no words matches
    /// nothing.
    pub async fn search_teams(
        &self,
        query: &str,
        search_type: SearchType,
    ) -> Result<Vec<Team>, RepoError> {
        let patterns = search_patterns(query, search_type);
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(move |conn| {
            let clauses = (1..=patterns.len())
                .map(|i| format!("(name || ' ' || description) LIKE ?{i} ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" AND ");

            let mut stmt = conn.prepare(&format!(
                "{TEAM_SELECT_SQL} WHERE is_deleted = 0 AND {clauses} ORDER BY id ASC"
            ))?;
            let teams = stmt
                .query_map(params_from_iter(patterns.iter()), team_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(teams)
        })
        .await
    }

    /// Overwrite name and description of a live team.
    pub async fn update_team(&self, team: &Team) -> Result<(), RepoError> {
        let team = team.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE teams SET name = ?2, description = ?3 WHERE id = ?1 AND is_deleted = 0",
                params![team.id as i64, team.name, team.description],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(team.id));
            }
            Ok(())
        })
        .await
    }

    /// Soft-delete a live team.
    pub async fn remove_team(&self, id: u64) -> Result<(), RepoError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE teams SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
                params![id as i64],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    /// Run `f` with a pooled connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepoError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl Repo for TeamStore {
    async fn add_teams(&self, teams: &[Team]) -> Result<Vec<u64>, RepoError> {
        if teams.is_empty() {
            return Ok(Vec::new());
        }

        let teams = teams.to_vec();
        self.with_conn(move |conn| insert_teams(conn, &teams)).await
    }
}

/// Insert `teams` in one transaction; nothing is kept on failure.
fn insert_teams(conn: &mut Connection, teams: &[Team]) -> Result<Vec<u64>, RepoError> {
    let tx = conn.transaction()?;
    let mut ids = Vec::with_capacity(teams.len());

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO teams (name, description, is_deleted) VALUES (?1, ?2, ?3)",
        )?;
        for team in teams {
            stmt.execute(params![team.name, team.description, team.is_deleted])?;
            ids.push(tx.last_insert_rowid() as u64);
        }
    }

    tx.commit()?;
    tracing::trace!(count = ids.len(), "Inserted team batch");
    Ok(ids)
}

/// LIKE patterns for a search query, one per required match.
fn search_patterns(query: &str, search_type: SearchType) -> Vec<String> {
    let words = query.split_whitespace().map(escape_like);
    match search_type {
        SearchType::Plain => words.map(|word| format!("%{word}%")).collect(),
        SearchType::Phrase => {
            let phrase = words.collect::<Vec<_>>().join(" ");
            if phrase.is_empty() {
                Vec::new()
            } else {
                vec![format!("%{phrase}%")]
            }
        }
    }
}

fn escape_like(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQLite integers are signed; larger values saturate.
fn clamp_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        description: row.get(2)?,
        is_deleted: row.get(3)?,
    })
}

/// Connection customizer that applies store pragmas.
#[derive(Debug)]
struct StoreConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for StoreConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas(conn)
    }
}
