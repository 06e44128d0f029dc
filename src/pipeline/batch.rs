//! Chunk splitting and the saver's pending buffer.
//!
//! - Split an ordered run of records into contiguous, bounded chunks
//! - Accumulate records until capacity is reached

/// Split `items` into contiguous chunks of at most `chunk_size` elements.
///
/// Chunks are produced in forward order and concatenate back to `items`.
/// Every chunk except possibly the last holds exactly `chunk_size` elements.
/// An empty input or a `chunk_size` of zero yields no chunks.
pub fn split_into_chunks<T>(items: &[T], chunk_size: usize) -> Vec<&[T]> {
    if items.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    items.chunks(chunk_size).collect()
}

/// Records waiting for a flush.
///
/// Owned by exactly one task; it is not shared and needs no locking.
#[derive(Debug)]
pub struct PendingBuffer<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T> PendingBuffer<T> {
    /// Create an empty buffer that reports full at `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append an item.
    ///
    /// Returns true if the buffer has reached capacity.
    pub fn push(&mut self, item: T) -> bool {
        self.items.push(item);
        self.is_full()
    }

    /// Check if the buffer has reached capacity.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Drain the buffer, returning all pending items in order.
    pub fn take(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity))
    }

    /// Put back items a flush could not persist, ahead of anything newer.
    pub fn restore(&mut self, failed: Vec<T>) {
        if self.items.is_empty() {
            self.items = failed;
        } else {
            self.items.splice(0..0, failed);
        }
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of pending items.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
