//! Asynchronous batched persistence pipeline.
//!
//! Provides:
//! - Chunk splitting and the pending buffer
//! - Chunked flushing through a bulk-write repo
//! - A saver that owns the buffer and decides when to flush

pub mod batch;
pub mod flusher;
pub mod saver;

pub use batch::{split_into_chunks, PendingBuffer};
pub use flusher::{ChunkFlusher, Flush};
pub use saver::{Saver, SaverConfig, SaverError, SaverState};
