//! Per-chunk transform-and-load worker.
//!
//! A worker owns exactly one chunk file and one store for its whole
//! lifetime; nothing is shared for writing with any other worker. All
//! inserts for the chunk run inside a single transaction committed after
//! the last record, so a failed chunk leaves its store unchanged.

use crate::error::{PipelineError, Result};
use crate::pipeline::Metrics;
use crate::store::{quote_ident, TableSchema};
use crate::transform::RowTransform;
use csv::ReaderBuilder;
use rusqlite::{params_from_iter, Connection};
use std::path::PathBuf;

/// One unit of work: a chunk file paired with its dedicated store.
#[derive(Debug, Clone)]
pub struct ChunkJob {
    /// 1-based chunk index.
    pub index: usize,
    /// Chunk CSV produced by the splitter.
    pub csv_path: PathBuf,
    /// Store provisioned for this chunk.
    pub store_path: PathBuf,
}

/// Outcome of a successfully committed chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkStats {
    /// Data records read from the chunk.
    pub rows_read: u64,
    /// Rows inserted into the chunk's store.
    pub rows_inserted: u64,
    /// Records the transform skipped.
    pub rows_skipped: u64,
}

/// Read one chunk, apply the transform to every data record, and load the
/// results into the chunk's store in a single transaction.
pub fn process_chunk(
    job: &ChunkJob,
    schema: &TableSchema,
    transform: &dyn RowTransform,
    has_header: bool,
    metrics: &Metrics,
) -> Result<ChunkStats> {
    tracing::debug!("Chunk {}: start ({})", job.index, job.csv_path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_path(&job.csv_path)?;

    let mut conn = Connection::open(&job.store_path)?;
    let tx = conn.transaction()?;
    let mut stats = ChunkStats::default();

    {
        let placeholders = (1..=schema.columns)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_ident(&schema.table)
        ))?;

        for record in reader.records() {
            let record = record?;
            stats.rows_read += 1;
            metrics.add_row_read();

            let row = transform
                .apply(&record)
                .map_err(|cause| PipelineError::Transform {
                    row: stats.rows_read,
                    cause,
                })?;

            let Some(row) = row else {
                stats.rows_skipped += 1;
                metrics.add_row_skipped();
                continue;
            };

            if row.len() != schema.columns {
                return Err(PipelineError::ColumnMismatch {
                    row: stats.rows_read,
                    expected: schema.columns,
                    actual: row.len(),
                });
            }

            insert.execute(params_from_iter(row))?;
            stats.rows_inserted += 1;
            metrics.add_row_inserted();
        }
    }

    tx.commit()?;

    tracing::debug!(
        "Chunk {}: committed {} row(s), skipped {}",
        job.index,
        stats.rows_inserted,
        stats.rows_skipped
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FnTransform, IdentityTransform};
    use rusqlite::types::Value;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn make_chunk(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("output-1.csv");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn make_store(dir: &Path, ddl: &str) -> PathBuf {
        let path = dir.join("output-1.db");
        Connection::open(&path).unwrap().execute(ddl, []).unwrap();
        path
    }

    fn rows_of(path: &Path) -> Vec<(String, i64)> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn.prepare("SELECT col_1, col_2 FROM t").unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    fn plus_ten() -> std::sync::Arc<impl RowTransform> {
        FnTransform::new(|record: &csv::StringRecord| {
            let n: i64 = record[1].parse()?;
            Ok(Some(vec![
                Value::Text(record[0].to_string()),
                Value::Integer(n + 10),
            ]))
        })
    }

    #[test]
    fn test_transform_and_load() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 1,
            csv_path: make_chunk(dir.path(), &["col_1,col_2", "a,1", "b,2", "c,3"]),
            store_path: make_store(dir.path(), "CREATE TABLE t (col_1 TEXT, col_2 INT)"),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let stats = process_chunk(&job, &schema, &*plus_ten(), true, &metrics).unwrap();
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.rows_inserted, 3);
        assert_eq!(stats.rows_skipped, 0);

        assert_eq!(
            rows_of(&job.store_path),
            vec![
                ("a".to_string(), 11),
                ("b".to_string(), 12),
                ("c".to_string(), 13),
            ]
        );
    }

    #[test]
    fn test_skip_marker_writes_no_row() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 1,
            csv_path: make_chunk(dir.path(), &["col_1,col_2", "a,1", "b,2"]),
            store_path: make_store(dir.path(), "CREATE TABLE t (col_1 TEXT, col_2 INT)"),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let skip_a = FnTransform::new(|record: &csv::StringRecord| {
            if &record[0] == "a" {
                return Ok(None);
            }
            let n: i64 = record[1].parse()?;
            Ok(Some(vec![
                Value::Text(record[0].to_string()),
                Value::Integer(n),
            ]))
        });

        let stats = process_chunk(&job, &schema, &*skip_a, true, &metrics).unwrap();
        assert_eq!(stats.rows_inserted, 1);
        assert_eq!(stats.rows_skipped, 1);
        assert_eq!(rows_of(&job.store_path), vec![("b".to_string(), 2)]);
    }

    #[test]
    fn test_transform_error_rolls_back() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 4,
            csv_path: make_chunk(dir.path(), &["col_1,col_2", "a,1", "b,oops", "c,3"]),
            store_path: make_store(dir.path(), "CREATE TABLE t (col_1 TEXT, col_2 INT)"),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let err = process_chunk(&job, &schema, &*plus_ten(), true, &metrics).unwrap_err();
        assert!(matches!(err, PipelineError::Transform { row: 2, .. }));

        // Nothing committed: the first record's insert was rolled back too.
        assert!(rows_of(&job.store_path).is_empty());
    }

    #[test]
    fn test_column_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 1,
            csv_path: make_chunk(dir.path(), &["col_1,col_2", "a,1"]),
            store_path: make_store(dir.path(), "CREATE TABLE t (col_1 TEXT, col_2 INT)"),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let wide = FnTransform::new(|_: &csv::StringRecord| {
            Ok(Some(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ]))
        });

        let err = process_chunk(&job, &schema, &*wide, true, &metrics).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ColumnMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_primary_key_collision_within_chunk_fails() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 1,
            csv_path: make_chunk(dir.path(), &["col_1,col_2", "a,1", "a,2"]),
            store_path: make_store(
                dir.path(),
                "CREATE TABLE t (col_1 TEXT PRIMARY KEY, col_2 INT)",
            ),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let err = process_chunk(&job, &schema, &*plus_ten(), true, &metrics).unwrap_err();
        assert!(matches!(err, PipelineError::Sql(_)));
        assert!(rows_of(&job.store_path).is_empty());
    }

    #[test]
    fn test_no_header_chunk_processes_first_record() {
        let dir = TempDir::new().unwrap();
        let job = ChunkJob {
            index: 1,
            csv_path: make_chunk(dir.path(), &["a,1", "b,2"]),
            store_path: make_store(dir.path(), "CREATE TABLE t (col_1 TEXT, col_2 INT)"),
        };
        let schema = TableSchema {
            table: "t".to_string(),
            columns: 2,
        };
        let metrics = Metrics::new();

        let stats = process_chunk(&job, &schema, &IdentityTransform, false, &metrics).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.rows_inserted, 2);
    }
}
