//! Chunk splitter.
//!
//! Streams the source CSV once and writes ordered chunk files of at most
//! `max_rows` data records each. When the source carries a header record it
//! is captured and re-emitted as the first record of every chunk, so each
//! chunk is a self-describing CSV in its own right.

use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// One chunk produced by the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    /// 1-based sequence index; determines filename and processing order.
    pub index: usize,
    /// Path of the materialized chunk CSV.
    pub path: PathBuf,
    /// Number of data records in the chunk (header excluded).
    pub rows: u64,
}

/// Filename of chunk `index` inside `output_dir`.
pub fn chunk_csv_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("output-{index}.csv"))
}

/// Split `source` into chunk files holding at most `max_rows` data records.
///
/// Chunks are returned in creation order, which equals original record
/// order. The final chunk may be short. A source with a header but no data
/// records produces no chunks at all.
pub fn split_csv(
    source: &Path,
    max_rows: u64,
    output_dir: &Path,
    has_header: bool,
) -> Result<Vec<ChunkFile>> {
    if !source.is_file() {
        return Err(PipelineError::NotFound(source.to_path_buf()));
    }
    if max_rows == 0 {
        return Err(PipelineError::InvalidArgument(
            "max_rows must be greater than 0".to_string(),
        ));
    }
    fs::create_dir_all(output_dir)?;

    // Header handling is manual so the captured header can be re-emitted
    // into every chunk; the reader itself never skips records.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(source)?;

    let mut records = reader.records();
    let header: Option<StringRecord> = if has_header {
        match records.next() {
            Some(record) => Some(record?),
            None => None,
        }
    } else {
        None
    };

    let mut chunks: Vec<ChunkFile> = Vec::new();
    let mut current: Option<(Writer<fs::File>, u64)> = None;

    for record in records {
        let record = record?;

        let full = current
            .as_ref()
            .map(|(_, rows)| *rows >= max_rows)
            .unwrap_or(true);
        if full {
            if let Some((writer, rows)) = current.take() {
                finish_chunk(writer, &mut chunks, rows)?;
            }
            let index = chunks.len() + 1;
            let path = chunk_csv_path(output_dir, index);
            let mut writer = WriterBuilder::new().flexible(true).from_path(&path)?;
            if let Some(header) = &header {
                writer.write_record(header)?;
            }
            chunks.push(ChunkFile {
                index,
                path,
                rows: 0,
            });
            current = Some((writer, 0));
        }

        if let Some((writer, rows)) = current.as_mut() {
            writer.write_record(&record)?;
            *rows += 1;
        }
    }

    if let Some((writer, rows)) = current.take() {
        finish_chunk(writer, &mut chunks, rows)?;
    }

    tracing::info!(
        "Split {} into {} chunk(s) (max {} rows each)",
        source.display(),
        chunks.len(),
        max_rows
    );

    Ok(chunks)
}

fn finish_chunk(
    mut writer: Writer<fs::File>,
    chunks: &mut [ChunkFile],
    rows: u64,
) -> Result<()> {
    writer.flush()?;
    if let Some(last) = chunks.last_mut() {
        last.rows = rows;
    }
    Ok(())
}
