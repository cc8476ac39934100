//! Row transforms applied by chunk workers.
//!
//! A transform is a pure mapping from one source record to either an output
//! row (an ordered tuple of SQL values) or a skip decision. Workers run on
//! separate threads, so transforms are shared as `Arc<dyn RowTransform>`
//! rather than captured closures over mutable state. The CLI selects
//! transforms by name through the [`TransformRegistry`].

mod registry;

pub use registry::TransformRegistry;

use csv::StringRecord;
use rusqlite::types::Value;
use std::sync::Arc;

/// An output row ready for a positional insert.
pub type OutputRow = Vec<Value>;

/// A pure record-to-row mapping, invoked once per data record.
///
/// Returning `Ok(None)` skips the record: no row is written for it in any
/// store. Errors abort the owning chunk worker without committing.
pub trait RowTransform: Send + Sync {
    /// Map one source record to an output row, or `None` to skip it.
    fn apply(&self, record: &StringRecord) -> anyhow::Result<Option<OutputRow>>;
}

/// Adapter lifting a plain function or closure into a [`RowTransform`].
pub struct FnTransform<F>(F);

impl<F> FnTransform<F>
where
    F: Fn(&StringRecord) -> anyhow::Result<Option<OutputRow>> + Send + Sync,
{
    /// Wrap a function as a transform.
    pub fn new(f: F) -> Arc<Self> {
        Arc::new(FnTransform(f))
    }
}

impl<F> RowTransform for FnTransform<F>
where
    F: Fn(&StringRecord) -> anyhow::Result<Option<OutputRow>> + Send + Sync,
{
    fn apply(&self, record: &StringRecord) -> anyhow::Result<Option<OutputRow>> {
        (self.0)(record)
    }
}

/// Pass-through transform: every field is loaded as text, no record skipped.
pub struct IdentityTransform;

impl RowTransform for IdentityTransform {
    fn apply(&self, record: &StringRecord) -> anyhow::Result<Option<OutputRow>> {
        Ok(Some(
            record
                .iter()
                .map(|field| Value::Text(field.to_string()))
                .collect(),
        ))
    }
}
