//! Pipeline orchestration: chunk workers, the driver, and run metrics.

mod driver;
mod metrics;
mod worker;


pub use driver::{run, RunReport};
pub use metrics::{Metrics, MetricsSnapshot};
pub use worker::{process_chunk, ChunkJob, ChunkStats};
