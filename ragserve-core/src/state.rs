//! Index lifecycle state with single-writer semantics.
//!
//! The original deployment kept a process-global "index initialized"
//! handle that concurrent uploads could race on. Here the state lives in
//! a `tokio::sync::RwLock`: uploads hold the write guard across their
//! whole read-modify-write (ensure collection, upsert, mark ready), so
//! they queue instead of losing updates. Queries take the cheap read path
//! and may observe pre- or post-upload state depending on timing.

use tokio::sync::{RwLock, RwLockWriteGuard};

/// Whether the index has received its first successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// No documents indexed yet; queries in the self-hosted profile are
    /// rejected.
    Uninitialized,
    /// At least one upload has been indexed.
    Ready,
}

/// Process-wide index lifecycle state.
#[derive(Debug, Default)]
pub struct IndexState {
    status: RwLock<IndexStatus>,
}

impl Default for IndexStatus {
    fn default() -> Self {
        IndexStatus::Uninitialized
    }
}

impl IndexState {
    /// Create state in [`IndexStatus::Uninitialized`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status (read lock only).
    pub async fn status(&self) -> IndexStatus {
        *self.status.read().await
    }

    /// Acquire the single-writer guard for an index-mutating operation.
    ///
    /// Only one writer proceeds at a time; the guard is held across the
    /// whole store mutation and released on drop.
    pub async fn writer(&self) -> IndexWriter<'_> {
        IndexWriter { guard: self.status.write().await }
    }
}

/// Exclusive write access to the index state.
pub struct IndexWriter<'a> {
    guard: RwLockWriteGuard<'a, IndexStatus>,
}

impl IndexWriter<'_> {
    /// Status as seen by this writer.
    pub fn status(&self) -> IndexStatus {
        *self.guard
    }

    /// Record that the index now holds documents.
    pub fn mark_ready(&mut self) {
        *self.guard = IndexStatus::Ready;
    }
}
