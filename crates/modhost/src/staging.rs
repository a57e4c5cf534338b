//! The host side of resource staging.

use mod_loader::{ResourceSource, ResourceStager};
use tracing::info;

/// Collects the resource sources of loaded mods.
///
/// Sources are logged and kept highest priority first. Ties keep staging
/// order.
#[derive(Debug, Default)]
pub struct ResourcePacks {
    staged: Vec<(i32, ResourceSource)>,
}

impl ResourcePacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

impl ResourceStager for ResourcePacks {
    fn stage(&mut self, source: ResourceSource, priority: i32) {
        info!(
            "📦 Resources for {} from {}:{} (priority {})",
            source.mod_id,
            source.archive.display(),
            source.location,
            priority
        );
        let index = self.staged.partition_point(|(p, _)| *p >= priority);
        self.staged.insert(index, (priority, source));
    }
}
