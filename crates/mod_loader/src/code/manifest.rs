//! Mods linked into the host at build time.

use super::{CodeContext, CodeLoader, ResolvedMod};
use crate::archive::CodeUnit;
use crate::error::CodeError;
use mod_api::{ModDeclaration, ModEntry};
use std::collections::HashMap;
use std::path::Path;

const UNIT_SUFFIXES: [&str; 1] = ["unit"];

#[derive(Clone, Copy)]
enum ManifestEntry {
    Mod(ModDeclaration),
    Plain,
}

/// Registry of statically linked types, keyed by qualified type name.
///
/// Archives name the types they ship with marker entries: an entry
/// `mods/alpha/AlphaMod.unit` resolves to the type registered as
/// `mods::alpha::AlphaMod`.
///
/// ```rust
/// use mod_api::{ConstructError, Mod, ModDescriptor, ModEntry};
/// use mod_loader::ModManifest;
///
/// struct AlphaMod;
/// impl Mod for AlphaMod {}
/// impl ModEntry for AlphaMod {
///     fn descriptor() -> ModDescriptor {
///         ModDescriptor::new("alpha", [1, 0])
///     }
///     fn construct() -> Result<Self, ConstructError> {
///         Ok(AlphaMod)
///     }
/// }
///
/// let manifest = ModManifest::new()
///     .with::<AlphaMod>("mods::alpha::AlphaMod")
///     .with_plain("mods::alpha::Helpers");
/// assert_eq!(manifest.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct ModManifest {
    entries: HashMap<String, ManifestEntry>,
}

impl ModManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mod entry type `T` under `type_name`.
    pub fn register<T: ModEntry>(&mut self, type_name: impl Into<String>) {
        self.entries
            .insert(type_name.into(), ManifestEntry::Mod(ModDeclaration::of::<T>()));
    }

    /// Registers a type that ships in archives but is not a mod.
    pub fn register_plain(&mut self, type_name: impl Into<String>) {
        self.entries.insert(type_name.into(), ManifestEntry::Plain);
    }

    pub fn with<T: ModEntry>(mut self, type_name: impl Into<String>) -> Self {
        self.register::<T>(type_name);
        self
    }

    pub fn with_plain(mut self, type_name: impl Into<String>) -> Self {
        self.register_plain(type_name);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ModManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ModManifest").field("types", &names).finish()
    }
}

impl CodeLoader for ModManifest {
    fn unit_suffixes(&self) -> &[&str] {
        &UNIT_SUFFIXES
    }

    fn open(&self) -> Result<Box<dyn CodeContext + '_>, CodeError> {
        Ok(Box::new(ManifestContext { manifest: self }))
    }
}

struct ManifestContext<'a> {
    manifest: &'a ModManifest,
}

impl CodeContext for ManifestContext<'_> {
    fn resolve(
        &mut self,
        _archive: &Path,
        unit: &CodeUnit,
    ) -> Result<Option<ResolvedMod>, CodeError> {
        match self.manifest.entries.get(&unit.type_name) {
            Some(ManifestEntry::Mod(declaration)) => Ok(Some(ResolvedMod::new(*declaration))),
            Some(ManifestEntry::Plain) => Ok(None),
            None => Err(CodeError::Unknown {
                type_name: unit.type_name.clone(),
            }),
        }
    }
}
