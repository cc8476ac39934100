//! Pipeline driver.
//!
//! Sequences the three phases: split, parallel transform-load, merge. Each
//! phase fully completes before the next begins; parallelism exists only
//! inside the transform-load phase, where chunk workers run as blocking
//! tasks fanned out with bounded concurrency. `collect().await` on the
//! worker stream is the completion barrier before the merge.
//!
//! On failure nothing is rolled back: chunk files, per-chunk stores and a
//! partially merged final store stay on disk. A failed run is disposable,
//! not resumable; callers re-run into a fresh output directory.

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::pipeline::worker::{self, ChunkJob, ChunkStats};
use crate::pipeline::Metrics;
use crate::split;
use crate::store::{self, TemplateStore};
use crate::transform::RowTransform;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Path of the final consolidated store.
    pub final_store: PathBuf,
    /// Number of chunks processed.
    pub chunks: usize,
    /// Total rows inserted across all chunks.
    pub rows_inserted: u64,
}

/// Run the full pipeline: split the source, transform-load every chunk in
/// parallel, and merge the per-chunk stores into one final store.
///
/// Returns the final store path. The first failure aborts the run; when
/// several workers fail concurrently, the one with the lowest chunk index
/// is surfaced.
pub async fn run(
    config: Arc<Config>,
    transform: Arc<dyn RowTransform>,
    metrics: Arc<Metrics>,
) -> Result<RunReport> {
    let start = Instant::now();

    // Fail-fast validation: nothing beyond existence checks happens before
    // all inputs are known to be usable.
    if !config.input.source.is_file() {
        return Err(PipelineError::NotFound(config.input.source.clone()));
    }
    if !config.input.template.is_file() {
        return Err(PipelineError::NotFound(config.input.template.clone()));
    }
    if config.processing.max_rows == 0 {
        return Err(PipelineError::InvalidArgument(
            "max_rows must be greater than 0".to_string(),
        ));
    }
    if config.processing.concurrency == 0 {
        return Err(PipelineError::InvalidArgument(
            "concurrency must be greater than 0".to_string(),
        ));
    }
    std::fs::create_dir_all(&config.output.dir)?;

    // Schema discovery happens before any chunk work so a bad template
    // aborts with nothing provisioned.
    let template = TemplateStore::open(&config.input.template)?;
    let schema = template.schema()?;
    tracing::info!(
        "Template table '{}' with {} column(s)",
        schema.table,
        schema.columns
    );

    let chunks = split::split_csv(
        &config.input.source,
        config.processing.max_rows,
        &config.output.dir,
        config.input.has_header,
    )?;
    if chunks.is_empty() {
        return Err(PipelineError::NoInputData);
    }

    let stores = store::provision(&template, &config.output.dir, chunks.len())?;

    let jobs: Vec<ChunkJob> = chunks
        .iter()
        .zip(&stores)
        .map(|(chunk, store_path)| ChunkJob {
            index: chunk.index,
            csv_path: chunk.path.clone(),
            store_path: store_path.clone(),
        })
        .collect();

    tracing::info!(
        "Dispatching {} chunk(s) across {} worker(s)",
        jobs.len(),
        config.processing.concurrency
    );

    let schema = Arc::new(schema);
    let has_header = config.input.has_header;

    let results: Vec<(usize, Result<ChunkStats>)> = stream::iter(jobs)
        .map(|job| {
            let schema = schema.clone();
            let transform = transform.clone();
            let metrics = metrics.clone();
            async move {
                let index = job.index;
                let outcome = tokio::task::spawn_blocking(move || {
                    worker::process_chunk(&job, &schema, transform.as_ref(), has_header, &metrics)
                })
                .await
                .unwrap_or_else(|e| Err(PipelineError::Task(e.to_string())));
                (index, outcome)
            }
        })
        .buffer_unordered(config.processing.concurrency)
        .collect()
        .await;

    // Completion barrier passed: every worker has returned. Surface the
    // lowest-index failure for a deterministic error.
    let mut rows_inserted = 0;
    let mut first_failure: Option<(usize, PipelineError)> = None;
    for (index, outcome) in results {
        match outcome {
            Ok(stats) => {
                rows_inserted += stats.rows_inserted;
                metrics.add_chunk_processed();
            }
            Err(err) => {
                metrics.add_chunk_failed();
                tracing::error!("Chunk {} failed: {}", index, err);
                if first_failure.as_ref().map_or(true, |(i, _)| index < *i) {
                    first_failure = Some((index, err));
                }
            }
        }
    }
    if let Some((index, err)) = first_failure {
        return Err(err.in_chunk(index));
    }

    let final_store = config.output.final_store_path();
    let table = schema.table.clone();
    let merged = tokio::task::spawn_blocking(move || {
        store::merge_stores(&stores, &table, &final_store)
    })
    .await
    .unwrap_or_else(|e| Err(PipelineError::Task(e.to_string())))?;

    tracing::info!(
        "Pipeline complete in {:.2?}: {}",
        start.elapsed(),
        metrics.snapshot()
    );

    Ok(RunReport {
        final_store: merged,
        chunks: chunks.len(),
        rows_inserted,
    })
}
