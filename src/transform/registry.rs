//! Named-transform registry.
//!
//! Workers run in isolated execution contexts, so the CLI cannot hand them
//! an arbitrary closure; it references a transform by a registered name
//! instead. Library callers may register their own transforms before
//! running the pipeline.

use crate::transform::{IdentityTransform, RowTransform};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping transform names to shared transform instances.
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn RowTransform>>,
}

impl TransformRegistry {
    /// Create a registry pre-populated with the built-in `identity` transform.
    pub fn new() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
        };
        registry.register("identity", Arc::new(IdentityTransform));
        registry
    }

    /// Register a transform under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, transform: Arc<dyn RowTransform>) {
        self.transforms.insert(name.to_string(), transform);
    }

    /// Look up a transform by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RowTransform>> {
        self.transforms.get(name).cloned()
    }

    /// Names of all registered transforms, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
