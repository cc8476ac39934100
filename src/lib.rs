//! Chunkload
//!
//! Bounded-parallel transform-and-load of a large CSV source into a single
//! consolidated SQLite store.
//!
//! # Architecture
//!
//! The pipeline has three strictly sequential phases:
//!
//! - **Split**: partition the source into ordered chunk files bounded by a
//!   row count, re-emitting the header into each chunk
//! - **Transform-load**: one worker per chunk applies the caller-supplied
//!   transform and loads the results into its own clone of the schema
//!   template, committing once per chunk
//! - **Merge**: consolidate all per-chunk stores into one final store,
//!   reusing the first store's schema and bulk-appending the rest
//!
//! # Usage
//!
//! ```no_run
//! use chunkload::{run_pipeline, Config, IdentityTransform};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file(&"config.yaml".into())?;
//!     let report = run_pipeline(config, Arc::new(IdentityTransform)).await?;
//!     println!("final store: {}", report.final_store.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod split;
pub mod store;
pub mod transform;

pub use config::{Config, InputConfig, OutputConfig, ProcessingConfig};
pub use error::PipelineError;
pub use pipeline::{Metrics, RunReport};
pub use split::ChunkFile;
pub use store::{TableSchema, TemplateStore};
pub use transform::{FnTransform, IdentityTransform, RowTransform, TransformRegistry};

use anyhow::Result;
use std::sync::Arc;

/// Run the full pipeline with the given configuration and transform.
pub async fn run_pipeline(
    config: Config,
    transform: Arc<dyn RowTransform>,
) -> Result<RunReport> {
    config.validate()?;

    let config = Arc::new(config);
    let metrics = Metrics::new();

    tracing::info!("Starting chunkload pipeline");
    tracing::info!(
        "Source: {}, template: {}, output: {}",
        config.input.source.display(),
        config.input.template.display(),
        config.output.dir.display()
    );

    let report = pipeline::run(config, transform, metrics).await?;

    tracing::info!(
        "Final store written to {} ({} chunk(s), {} row(s))",
        report.final_store.display(),
        report.chunks,
        report.rows_inserted
    );

    Ok(report)
}

/// Build a Tokio runtime with the specified configuration.
pub fn build_runtime(worker_threads: Option<usize>) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    builder.enable_all();

    Ok(builder.build()?)
}
