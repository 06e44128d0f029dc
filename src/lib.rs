//! Team Saver: a buffered, chunked persistence pipeline for team records.
//!
//! Producers hand records to a [`pipeline::Saver`], whose single owning task
//! buffers them and flushes on capacity, on a timer, or at shutdown. Each
//! flush splits the buffer into fixed-size chunks and bulk-writes them
//! through a [`storage::Repo`]; chunks that fail stay buffered for the next
//! trigger.
//!
//! # Modules
//!
//! - [`app`]: stdin ingestion driver for the binary
//! - [`config`]: CLI and environment configuration
//! - [`events`]: Team lifecycle notification bus
//! - [`model`]: Team record and validation
//! - [`observability`]: Tracing setup
//! - [`pipeline`]: Chunk splitter, flusher and saver
//! - [`service`]: Synchronous team operations
//! - [`storage`]: Bulk-write capability and the SQLite store

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // pipeline::saver::SaverConfig is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::cast_possible_wrap,         // SQLite rowids are i64, ids are u64
    clippy::cast_sign_loss
)]

pub mod app;
pub mod config;
pub mod events;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod service;
pub mod storage;

pub use model::{NewTeam, SearchType, Team};
pub use pipeline::{ChunkFlusher, Flush, Saver, SaverConfig, SaverError, SaverState};
pub use storage::{Repo, RepoError};
