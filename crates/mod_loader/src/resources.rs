//! Handing mod-bundled resources to the host's resource manager.

use crate::registry::Registry;
use std::path::PathBuf;
use tracing::debug;

/// Where one mod's resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSource {
    pub mod_id: String,
    /// Archive the mod was loaded from
    pub archive: PathBuf,
    /// Directory inside the archive, as declared by the mod
    pub location: String,
}

/// The host's resource manager, as far as mods are concerned.
pub trait ResourceStager {
    fn stage(&mut self, source: ResourceSource, priority: i32);
}

impl<F> ResourceStager for F
where
    F: FnMut(ResourceSource, i32),
{
    fn stage(&mut self, source: ResourceSource, priority: i32) {
        self(source, priority)
    }
}

/// Stages the resources of every loaded mod, in registry order.
pub fn stage_mod_resources(registry: &Registry, stager: &mut dyn ResourceStager, priority: i32) {
    for record in registry {
        debug!(
            target: "mod_loader",
            mod_id = %record.id(),
            "Staging resources from {}",
            record.archive().display()
        );
        stager.stage(
            ResourceSource {
                mod_id: record.id().to_string(),
                archive: record.archive().to_path_buf(),
                location: record.descriptor().resource_location.clone(),
            },
            priority,
        );
    }
}
