//! Run counters collected across concurrent chunk workers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics for a pipeline run.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Data records read from chunk files
    pub rows_read: AtomicU64,

    /// Rows inserted into per-chunk stores
    pub rows_inserted: AtomicU64,

    /// Records the transform chose to skip
    pub rows_skipped: AtomicU64,

    /// Chunks committed successfully
    pub chunks_processed: AtomicU64,

    /// Chunks whose worker failed
    pub chunks_failed: AtomicU64,
}

impl Metrics {
    /// Create new metrics.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a data record read.
    pub fn add_row_read(&self) {
        self.rows_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inserted row.
    pub fn add_row_inserted(&self) {
        self.rows_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a skipped record.
    pub fn add_row_skipped(&self) {
        self.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed chunk.
    pub fn add_chunk_processed(&self) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed chunk.
    pub fn add_chunk_failed(&self) {
        self.chunks_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_read: self.rows_read.load(Ordering::Relaxed),
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of run counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub rows_read: u64,
    pub rows_inserted: u64,
    pub rows_skipped: u64,
    pub chunks_processed: u64,
    pub chunks_failed: u64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rows read: {}, inserted: {}, skipped: {}, chunks ok: {}, failed: {}",
            self.rows_read,
            self.rows_inserted,
            self.rows_skipped,
            self.chunks_processed,
            self.chunks_failed
        )
    }
}
