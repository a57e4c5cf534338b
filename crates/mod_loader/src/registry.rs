//! Loaded mods.

use crate::code::KeepAlive;
use mod_api::{ids_match, InstanceRequest, ModDescriptor, ModInstance, Version};
use std::path::{Path, PathBuf};

/// A constructed mod and where it came from.
///
/// Two records are equal when their ids match (ignoring case) and their
/// versions are equal.
pub struct ModRecord {
    descriptor: ModDescriptor,
    instance: ModInstance,
    archive: PathBuf,
    type_name: String,
    wants: Vec<InstanceRequest>,
}

impl ModRecord {
    pub fn new(
        descriptor: ModDescriptor,
        instance: ModInstance,
        archive: PathBuf,
        type_name: String,
        wants: Vec<InstanceRequest>,
    ) -> Self {
        Self {
            descriptor,
            instance,
            archive,
            type_name,
            wants,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn version(&self) -> &Version {
        &self.descriptor.version
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &ModDescriptor {
        &self.descriptor
    }

    pub fn instance(&self) -> &ModInstance {
        &self.instance
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn wants(&self) -> &[InstanceRequest] {
        &self.wants
    }

    pub fn has_identity(&self, id: &str, version: &Version) -> bool {
        ids_match(self.id(), id) && self.version() == version
    }
}

impl PartialEq for ModRecord {
    fn eq(&self, other: &Self) -> bool {
        other.has_identity(self.id(), self.version())
    }
}

impl Eq for ModRecord {}

impl std::fmt::Debug for ModRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModRecord")
            .field("id", &self.descriptor.id)
            .field("version", &self.descriptor.version.to_string())
            .field("archive", &self.archive)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Append-only list of loaded mods, in instantiation order.
#[derive(Default)]
pub struct Registry {
    records: Vec<ModRecord>,
    // Declared after `records`: instances drop before the code behind them.
    code: Vec<KeepAlive>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: ModRecord, keep_alive: Option<KeepAlive>) {
        self.records.push(record);
        if let Some(keep_alive) = keep_alive {
            self.code.push(keep_alive);
        }
    }

    pub fn contains(&self, id: &str, version: &Version) -> bool {
        self.records.iter().any(|record| record.has_identity(id, version))
    }

    /// First record whose id matches `id`, ignoring case.
    pub fn get(&self, id: &str) -> Option<&ModRecord> {
        self.records.iter().find(|record| ids_match(record.id(), id))
    }

    pub fn records(&self) -> &[ModRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("records", &self.records)
            .field("code_units", &self.code.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ModRecord;
    type IntoIter = std::slice::Iter<'a, ModRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mod_api::Mod;
    use std::sync::Arc;

    struct Dummy;
    impl Mod for Dummy {}

    fn record(id: &str, version: [u64; 2]) -> ModRecord {
        ModRecord::new(
            ModDescriptor::new(id, version),
            Arc::new(Dummy),
            PathBuf::from(format!("{}.zip", id)),
            format!("mods::{}", id),
            Vec::new(),
        )
    }

    #[test]
    fn identity_ignores_id_case() {
        assert_eq!(record("Alpha", [1, 0]), record("alpha", [1, 0]));
        assert_ne!(record("alpha", [1, 0]), record("alpha", [1, 1]));
    }

    #[test]
    fn lookup_returns_first_match() {
        let mut registry = Registry::new();
        registry.push(record("alpha", [1, 0]), None);
        registry.push(record("ALPHA", [2, 0]), None);

        assert!(registry.contains("Alpha", &Version::from([2, 0])));
        assert!(!registry.contains("alpha", &Version::from([3, 0])));
        assert_eq!(registry.get("alpha").unwrap().version(), &Version::from([1, 0]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn keeps_code_alive_until_dropped() {
        let code: KeepAlive = Arc::new(());
        let mut registry = Registry::new();
        registry.push(record("alpha", [1, 0]), Some(code.clone()));
        assert_eq!(Arc::strong_count(&code), 2);
        drop(registry);
        assert_eq!(Arc::strong_count(&code), 1);
    }
}
