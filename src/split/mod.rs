//! Source partitioning into bounded chunk files.

mod splitter;

pub use splitter::{split_csv, ChunkFile};
