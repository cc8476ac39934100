//! SQLite store handling: template inspection, per-chunk provisioning,
//! and the final merge.

mod merge;
mod template;

pub use merge::merge_stores;
pub use template::{provision, quote_ident, TableSchema, TemplateStore};
