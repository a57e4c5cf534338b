//! Mods compiled as dynamic libraries.

use super::{CodeContext, CodeLoader, KeepAlive, ResolvedMod};
use crate::archive::CodeUnit;
use crate::error::CodeError;
use libloading::{Library, Symbol};
use mod_api::{ModDeclaration, MOD_API_VERSION, MOD_DECLARATION_SYMBOL};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info};

type DeclarationFn = unsafe extern "C" fn() -> *mut ModDeclaration;

const LIBRARY_SUFFIXES: [&str; 3] = ["so", "dll", "dylib"];

/// Loads mods from dynamic libraries packed in archives.
///
/// Every library is extracted into a staging directory shared by the whole
/// load and opened with `libloading`. A library exports a mod through
/// [`mod_api::export_mod!`]; libraries without that export are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl DylibLoader {
    pub fn new() -> Self {
        Self
    }
}

impl CodeLoader for DylibLoader {
    fn unit_suffixes(&self) -> &[&str] {
        &LIBRARY_SUFFIXES
    }

    fn open(&self) -> Result<Box<dyn CodeContext + '_>, CodeError> {
        let staging = tempfile::Builder::new()
            .prefix("mod-libraries-")
            .tempdir()
            .map_err(|e| CodeError::Context(format!("failed to create staging directory: {}", e)))?;
        debug!(target: "mod_loader", "Staging mod libraries in {}", staging.path().display());
        Ok(Box::new(DylibContext {
            staging: Arc::new(staging),
            extracted: 0,
        }))
    }
}

struct DylibContext {
    staging: Arc<TempDir>,
    extracted: usize,
}

/// A library held open on behalf of the mods it declared.
struct LoadedLibrary {
    _library: Library,
    // Dropped after `_library`.
    _staging: Arc<TempDir>,
}

impl DylibContext {
    /// Picks where `unit` is extracted. Libraries keep their file names,
    /// which other mod libraries may link against. A name that is already
    /// taken goes into a numbered subdirectory.
    fn staged_path(&mut self, unit: &CodeUnit) -> Result<PathBuf, CodeError> {
        self.extracted += 1;
        let file_name = unit
            .entry_name
            .rsplit('/')
            .next()
            .unwrap_or(unit.entry_name.as_str());
        let path = self.staging.path().join(file_name);
        if !path.exists() {
            return Ok(path);
        }
        let dir = self.staging.path().join(format!("{:04}", self.extracted));
        std::fs::create_dir(&dir).map_err(|e| CodeError::io_at(&dir, e))?;
        Ok(dir.join(file_name))
    }
}

impl CodeContext for DylibContext {
    fn resolve(
        &mut self,
        archive: &Path,
        unit: &CodeUnit,
    ) -> Result<Option<ResolvedMod>, CodeError> {
        let path = self.staged_path(unit)?;
        std::fs::write(&path, &unit.data).map_err(|e| CodeError::io_at(&path, e))?;

        debug!(
            target: "mod_loader",
            archive = %archive.display(),
            type_name = %unit.type_name,
            "Loading mod library from {}",
            path.display()
        );

        // SAFETY: mods run with full host trust; loading runs their initializers.
        let library = unsafe { Library::new(&path) }.map_err(|e| {
            CodeError::load(&unit.type_name, format!("failed to load library: {}", e))
        })?;

        let declaration = {
            // SAFETY: the symbol type is the one `export_mod!` generates.
            let symbol: Symbol<DeclarationFn> =
                match unsafe { library.get(MOD_DECLARATION_SYMBOL) } {
                    Ok(symbol) => symbol,
                    Err(_) => {
                        debug!(
                            target: "mod_loader",
                            type_name = %unit.type_name,
                            "Library exports no mod"
                        );
                        return Ok(None);
                    }
                };

            // SAFETY: the declaration is a leaked Box handed over by the library.
            let declaration_ptr = unsafe { symbol() };
            if declaration_ptr.is_null() {
                return Err(CodeError::load(
                    &unit.type_name,
                    "mod_declaration returned null pointer",
                ));
            }
            *unsafe { Box::from_raw(declaration_ptr) }
        };

        if declaration.api_version != MOD_API_VERSION {
            return Err(CodeError::ApiMismatch {
                type_name: unit.type_name.clone(),
                found: declaration.api_version.to_string(),
                expected: MOD_API_VERSION,
            });
        }

        info!(target: "mod_loader", type_name = %unit.type_name, "Loaded mod library");
        let keep_alive: KeepAlive = Arc::new(LoadedLibrary {
            _library: library,
            _staging: self.staging.clone(),
        });
        Ok(Some(ResolvedMod::new(declaration).kept_alive_by(keep_alive)))
    }
}
