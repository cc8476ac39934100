//! Consolidation of per-chunk stores into the final store.
//!
//! The first store is copied wholesale to the output path, establishing the
//! final schema. Every remaining store is then attached and its rows
//! appended with a single bulk `INSERT ... SELECT`, entirely in-process.
//! No schema compatibility checking is performed beyond assuming all
//! stores share the table's structure; a primary-key collision across
//! input stores surfaces as a structured merge error and may leave the
//! final store partially merged.

use crate::error::{PipelineError, Result};
use crate::store::quote_ident;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// Merge `stores` into a single store at `output_path`.
///
/// Inputs are processed in slice order, so callers passing chunk-ordered
/// paths get a deterministic merge. Returns the final store path.
pub fn merge_stores(stores: &[PathBuf], table: &str, output_path: &Path) -> Result<PathBuf> {
    let Some((base, rest)) = stores.split_first() else {
        return Err(PipelineError::NoInputData);
    };

    // The base copy carries both schema and the first chunk's rows.
    fs::copy(base, output_path)?;

    let conn = Connection::open(output_path)?;
    let table_ident = quote_ident(table);

    for store in rest {
        append_store(&conn, store, &table_ident).map_err(|source| PipelineError::Merge {
            store: store.clone(),
            source,
        })?;
    }

    tracing::info!(
        "Merged {} store(s) into {}",
        stores.len(),
        output_path.display()
    );

    Ok(output_path.to_path_buf())
}

fn append_store(
    conn: &Connection,
    store: &Path,
    table_ident: &str,
) -> std::result::Result<(), rusqlite::Error> {
    conn.execute(
        "ATTACH DATABASE ?1 AS src",
        [store.to_string_lossy().into_owned()],
    )?;
    let result = conn.execute(
        &format!("INSERT INTO main.{table_ident} SELECT * FROM src.{table_ident}"),
        [],
    );
    // Detach even when the insert failed, so later error handling sees a
    // connection without a stale attachment.
    let detach = conn.execute("DETACH DATABASE src", []);
    result?;
    detach?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn make_store(path: &Path, ddl: &str, names: &[&str]) -> PathBuf {
        let conn = Connection::open(path).unwrap();
        conn.execute(ddl, []).unwrap();
        for name in names {
            conn.execute("INSERT INTO t (name) VALUES (?1)", [name])
                .unwrap();
        }
        path.to_path_buf()
    }

    fn names_in(path: &Path) -> HashSet<String> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn.prepare("SELECT name FROM t").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_merge_is_union_of_rows() {
        let dir = TempDir::new().unwrap();
        let ddl = "CREATE TABLE t (name TEXT)";
        let a = make_store(&dir.path().join("a.db"), ddl, &["Alice", "Bob"]);
        let b = make_store(&dir.path().join("b.db"), ddl, &["Charlie", "David"]);
        let out = dir.path().join("output.db");

        let merged = merge_stores(&[a, b], "t", &out).unwrap();
        assert_eq!(merged, out);

        let expected: HashSet<String> = ["Alice", "Bob", "Charlie", "David"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names_in(&out), expected);
    }

    #[test]
    fn test_merge_single_store() {
        let dir = TempDir::new().unwrap();
        let a = make_store(
            &dir.path().join("a.db"),
            "CREATE TABLE t (name TEXT)",
            &["Alice"],
        );
        let out = dir.path().join("output.db");

        merge_stores(&[a], "t", &out).unwrap();
        assert_eq!(names_in(&out).len(), 1);
    }

    #[test]
    fn test_merge_empty_input_fails() {
        let dir = TempDir::new().unwrap();
        let err = merge_stores(&[], "t", &dir.path().join("output.db")).unwrap_err();
        assert!(matches!(err, PipelineError::NoInputData));
    }

    #[test]
    fn test_primary_key_collision_fails() {
        let dir = TempDir::new().unwrap();
        let ddl = "CREATE TABLE t (name TEXT PRIMARY KEY)";
        let a = make_store(&dir.path().join("a.db"), ddl, &["Alice", "Bob"]);
        let b = make_store(&dir.path().join("b.db"), ddl, &["Bob", "Charlie"]);
        let out = dir.path().join("output.db");

        let err = merge_stores(&[a, b.clone()], "t", &out).unwrap_err();
        match err {
            PipelineError::Merge { store, .. } => assert_eq!(store, b),
            other => panic!("expected merge error, got {other}"),
        }
        // Base copy is still on disk; partial state is a documented limitation.
        assert!(out.exists());
    }
}
