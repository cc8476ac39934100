//! Schema template inspection and per-chunk store provisioning.
//!
//! The template is an existing SQLite database holding exactly one table.
//! Its table name and column count define the positional insert contract
//! used by every chunk worker and by the final merge. Provisioning clones
//! the template file once per chunk, giving each worker a fully
//! independent store with the same schema.

use crate::error::{PipelineError, Result};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

/// Schema of the template's single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name, as stored in `sqlite_master`.
    pub table: String,
    /// Number of columns; every inserted row must match this arity.
    pub columns: usize,
}

/// A read-only handle on the schema template database.
#[derive(Debug)]
pub struct TemplateStore {
    path: PathBuf,
    conn: Connection,
}

impl TemplateStore {
    /// Open the template read-only.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::NotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Path the template was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discover the template's single table.
    ///
    /// Fails with a schema error when the template holds zero or more than
    /// one table; this is checked once, before any chunk work begins.
    pub fn schema(&self) -> Result<TableSchema> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        if tables.len() != 1 {
            return Err(PipelineError::Schema {
                tables: tables.len(),
            });
        }
        let table = tables.into_iter().next().expect("one table");

        let columns: usize = self.conn.query_row(
            &format!("SELECT count(*) FROM pragma_table_info({})", quote_str(&table)),
            [],
            |row| row.get::<_, i64>(0).map(|n| n as usize),
        )?;

        Ok(TableSchema { table, columns })
    }
}

/// Filename of the per-chunk store for chunk `index` inside `output_dir`.
pub fn chunk_store_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("output-{index}.db"))
}

/// Clone the template into one fresh store per chunk.
///
/// Each clone is a byte copy of the template file, so it carries the full
/// schema and is independent of every other clone. Returns the store paths
/// in chunk order.
pub fn provision(
    template: &TemplateStore,
    output_dir: &Path,
    chunk_count: usize,
) -> Result<Vec<PathBuf>> {
    let mut stores = Vec::with_capacity(chunk_count);
    for index in 1..=chunk_count {
        let path = chunk_store_path(output_dir, index);
        fs::copy(template.path(), &path)?;
        stores.push(path);
    }
    tracing::debug!(
        "Provisioned {} store(s) from template {}",
        stores.len(),
        template.path().display()
    );
    Ok(stores)
}

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for interpolation into SQL.
fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
