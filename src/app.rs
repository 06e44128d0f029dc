//! Application driver for the `team-saver` binary.
//!
//! - `ingest` streams newline-delimited JSON teams into a [`Saver`] and
//!   closes it on end of input or shutdown
//! - every other command is a one-shot call on [`TeamService`] whose result
//!   and emitted events are written as JSON lines

use anyhow::Context;
use serde_json::json;
use std::fs;
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

use crate::config::{Cli, Command, Config};
use crate::events::EventBus;
use crate::model::{NewTeam, Team, ValidationError};
use crate::pipeline::{ChunkFlusher, Saver, SaverError};
use crate::service::TeamService;
use crate::storage::TeamStore;

/// Outcome of an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records handed to the saver
    pub accepted: usize,
    /// Lines skipped as malformed or invalid
    pub rejected: usize,
}

/// Error type for ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Saver(#[from] SaverError),
}

#[derive(Debug, Error)]
enum RecordError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Run the parsed command line until completion or shutdown.
pub async fn run(cli: Cli, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let config = cli.config;

    fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("failed to create data dir {}", config.data_dir.display())
    })?;

    let store = TeamStore::open(config.db_path(), config.pool_size)
        .with_context(|| format!("failed to open store at {}", config.db_path().display()))?;

    match cli.command {
        Command::Ingest => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_ingest(&config, store, stdin, shutdown).await?;
        }
        command => {
            let service = TeamService::new(
                store,
                EventBus::new(config.event_channel_size()),
                config.chunk_size(),
            );
            let mut stdout = std::io::stdout().lock();
            run_command(&service, command, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Feed `reader` through a saver built from `config`, then close it.
pub async fn run_ingest<R>(
    config: &Config,
    store: TeamStore,
    reader: R,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<IngestReport>
where
    R: AsyncBufRead + Unpin,
{
    let flusher = ChunkFlusher::new(config.chunk_size(), store);
    let saver = Saver::new(config.saver_config(), flusher).context("failed to start saver")?;

    tracing::info!(
        capacity = config.capacity,
        flush_interval_ms = config.flush_interval_ms,
        chunk_size = config.chunk_size,
        "Ingesting teams"
    );

    let result = ingest(reader, &saver, shutdown).await;

    // Whatever was accepted gets its final flush even if reading failed.
    saver.close().await;

    let report = result.context("ingest failed")?;
    tracing::info!(
        accepted = report.accepted,
        rejected = report.rejected,
        "Ingest finished"
    );
    Ok(report)
}

/// Read JSON team records line by line and hand each to `saver`.
///
/// Blank lines and `#` comments are skipped. Malformed or invalid records
/// are counted and logged. Stops at end of input or when `shutdown` turns
/// true.
pub async fn ingest<R>(
    reader: R,
    saver: &Saver,
    shutdown: watch::Receiver<bool>,
) -> Result<IngestReport, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(reader.lines());
    let stop = wait_for_shutdown(shutdown);
    tokio::pin!(stop);

    let mut report = IngestReport::default();
    let mut line_no = 0usize;

    loop {
        let next = tokio::select! {
            () = &mut stop => {
                tracing::info!("Shutdown requested, no longer reading input");
                break;
            }
            next = lines.next() => next,
        };

        let Some(line) = next else { break };
        let line = line?;
        line_no += 1;

        let record = line.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }

        match parse_record(record) {
            Ok(team) => {
                saver.save(team).await?;
                report.accepted += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping record");
                report.rejected += 1;
            }
        }
    }

    Ok(report)
}

/// Execute a one-shot service command, writing JSON lines to `out`.
pub async fn run_command<W: Write>(
    service: &TeamService,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut events = service.events().subscribe();

    match command {
        Command::Ingest => anyhow::bail!("ingest is not a one-shot command"),
        Command::Create { name, description } => {
            let id = service.create_team(NewTeam::new(name, description)).await?;
            writeln!(out, "{}", json!({ "id": id }))?;
        }
        Command::Get { id } => {
            let team = service.get_team(id).await?;
            writeln!(out, "{}", serde_json::to_string(&team)?)?;
        }
        Command::List { limit, offset } => {
            let (teams, total) = service.list_teams(limit, offset).await?;
            writeln!(out, "{}", json!({ "total": total, "teams": teams }))?;
        }
        Command::Update {
            id,
            name,
            description,
        } => {
            service
                .update_team(id, NewTeam::new(name, description))
                .await?;
        }
        Command::Search { query, mode } => {
            let teams = service.search_teams(&query, mode).await?;
            writeln!(out, "{}", json!({ "teams": teams }))?;
        }
        Command::Remove { id } => {
            service.remove_team(id).await?;
        }
    }

    while let Ok(event) = events.try_recv() {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }

    Ok(())
}

fn parse_record(line: &str) -> Result<Team, RecordError> {
    let new: NewTeam = serde_json::from_str(line)?;
    let team = Team::from(new);
    team.validate()?;
    Ok(team)
}

/// Resolve once shutdown is signalled; never if the sender goes away.
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    let sender_gone = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
