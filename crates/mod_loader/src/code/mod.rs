//! Code-loading contexts: how code units inside archives become mod types.
//!
//! A [`CodeLoader`] opens one [`CodeContext`] per load. The classifier
//! feeds the context every code unit of every archive and gets back, for
//! each, either a mod declaration, "not a mod", or an error.

mod dylib;
mod manifest;

pub use dylib::DylibLoader;
pub use manifest::ModManifest;

use crate::archive::CodeUnit;
use crate::error::CodeError;
use mod_api::ModDeclaration;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

/// Keeps the code behind a mod type loaded for as long as it is held.
pub type KeepAlive = Arc<dyn Any + Send + Sync>;

/// A mod type resolved from a code unit.
#[derive(Clone)]
pub struct ResolvedMod {
    pub declaration: ModDeclaration,
    pub keep_alive: Option<KeepAlive>,
}

impl ResolvedMod {
    pub fn new(declaration: ModDeclaration) -> Self {
        Self {
            declaration,
            keep_alive: None,
        }
    }

    pub fn kept_alive_by(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }
}

impl std::fmt::Debug for ResolvedMod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMod")
            .field("declaration", &self.declaration)
            .field("keep_alive", &self.keep_alive.is_some())
            .finish()
    }
}

/// Source of code-loading contexts.
pub trait CodeLoader {
    /// Entry suffixes (without the dot, compared ignoring ASCII case) that
    /// mark an archive entry as a code unit.
    fn unit_suffixes(&self) -> &[&str];

    /// Opens the context shared by every archive of one load.
    fn open(&self) -> Result<Box<dyn CodeContext + '_>, CodeError>;
}

pub trait CodeContext {
    /// Resolves one code unit. `Ok(None)` means the unit is valid code
    /// but declares no mod.
    fn resolve(
        &mut self,
        archive: &Path,
        unit: &CodeUnit,
    ) -> Result<Option<ResolvedMod>, CodeError>;
}
