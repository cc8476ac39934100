//! Error taxonomy for the pipeline.
//!
//! Every failure surfaces to the driver's caller with enough context to
//! identify the failing phase and, where applicable, the failing chunk.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures produced by any phase of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// A caller-supplied argument is out of range or unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The schema template does not contain exactly one table.
    #[error("template store must contain exactly one table, found {tables}")]
    Schema {
        /// Number of tables found in the template.
        tables: usize,
    },

    /// A transform output row did not match the table's column count.
    #[error("row {row}: transform produced {actual} fields, table has {expected} columns")]
    ColumnMismatch {
        /// 1-based data row number within the chunk.
        row: u64,
        /// Column count of the destination table.
        expected: usize,
        /// Field count of the transform output.
        actual: usize,
    },

    /// The caller-supplied transform returned an error.
    #[error("row {row}: transform failed: {cause:#}")]
    Transform {
        /// 1-based data row number within the chunk.
        row: u64,
        /// Underlying transform error.
        cause: anyhow::Error,
    },

    /// A chunk worker failed; wraps the underlying cause.
    #[error("chunk {index} failed: {source}")]
    Chunk {
        /// 1-based chunk index.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<PipelineError>,
    },

    /// No per-chunk stores were available to merge.
    #[error("no input stores to merge")]
    NoInputData,

    /// Appending a store's rows into the final store failed.
    ///
    /// The final store may be left partially merged; there is no rollback
    /// of inputs merged before the failure.
    #[error("merge failed while appending {store}: {source}")]
    Merge {
        /// The input store whose append failed.
        store: PathBuf,
        /// Underlying SQLite error (e.g. a uniqueness violation).
        #[source]
        source: rusqlite::Error,
    },

    /// A worker task panicked or was aborted by the runtime.
    #[error("worker task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}

impl PipelineError {
    /// Wrap an error with the chunk index it occurred in.
    pub fn in_chunk(self, index: usize) -> Self {
        PipelineError::Chunk {
            index,
            source: Box::new(self),
        }
    }

    /// The chunk index this error occurred in, if any.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            PipelineError::Chunk { index, .. } => Some(*index),
            _ => None,
        }
    }
}
