//! Turns archives into load candidates.

use crate::archive::read_code_units;
use crate::code::{CodeLoader, KeepAlive};
use crate::error::{CodeError, LoadReport, ModLoadIssue};
use crate::progress::ProgressReporter;
use mod_api::{ConstructError, InstanceRequest, ModDeclaration, ModDescriptor};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A mod type found in an archive, not yet instantiated.
pub struct LoadCandidate {
    pub archive: PathBuf,
    pub type_name: String,
    pub descriptor: ModDescriptor,
    pub wants: Vec<InstanceRequest>,
    pub declaration: ModDeclaration,
    pub keep_alive: Option<KeepAlive>,
}

impl std::fmt::Debug for LoadCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCandidate")
            .field("archive", &self.archive)
            .field("type_name", &self.type_name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Resolves every code unit of every archive through one shared context.
///
/// Unreadable archives are skipped whole; units that fail to resolve are
/// skipped alone. The context is dropped before returning, the code behind
/// each candidate stays loaded through its keep-alive handle.
pub fn classify(
    archives: &[PathBuf],
    loader: &dyn CodeLoader,
    progress: &ProgressReporter,
    report: &mut LoadReport,
) -> Result<Vec<LoadCandidate>, CodeError> {
    let mut context = loader.open()?;
    let unit_suffixes = loader.unit_suffixes();
    let mut candidates = Vec::new();

    for (index, archive) in archives.iter().enumerate() {
        progress.step(&archive_label(archive), index + 1, archives.len());

        let units = match read_code_units(archive, unit_suffixes) {
            Ok(units) => units,
            Err(e) => {
                report.record(ModLoadIssue::ArchiveRead {
                    archive: archive.clone(),
                    details: e.to_string(),
                });
                continue;
            }
        };

        for unit in units {
            let resolved = match context.resolve(archive, &unit) {
                Ok(Some(resolved)) => resolved,
                Ok(None) => continue,
                Err(e) => {
                    report.record(ModLoadIssue::CodeResolution {
                        archive: archive.clone(),
                        type_name: unit.type_name.clone(),
                        details: e.to_string(),
                    });
                    continue;
                }
            };

            let declaration = resolved.declaration;
            let metadata = catch_unwind(AssertUnwindSafe(|| {
                ((declaration.descriptor)(), (declaration.wants)())
            }));
            let (descriptor, wants) = match metadata {
                Ok(metadata) => metadata,
                Err(payload) => {
                    report.record(ModLoadIssue::CodeResolution {
                        archive: archive.clone(),
                        type_name: unit.type_name.clone(),
                        details: ConstructError::from_panic(payload).to_string(),
                    });
                    continue;
                }
            };

            debug!(
                target: "mod_loader",
                mod_id = %descriptor.id,
                type_name = %unit.type_name,
                "Found mod candidate in {}",
                archive.display()
            );
            candidates.push(LoadCandidate {
                archive: archive.clone(),
                type_name: unit.type_name,
                descriptor,
                wants,
                declaration,
                keep_alive: resolved.keep_alive,
            });
        }
    }

    drop(context);
    report.candidates = candidates.len();
    Ok(candidates)
}

fn archive_label(archive: &Path) -> String {
    archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ModManifest;
    use crate::testing::ZipFixture;
    use mod_api::{Mod, ModEntry};

    struct Listed;
    impl Mod for Listed {}
    impl ModEntry for Listed {
        fn descriptor() -> ModDescriptor {
            ModDescriptor::new("listed", [1, 0])
        }
        fn wants() -> Vec<InstanceRequest> {
            vec![InstanceRequest::own("me")]
        }
        fn construct() -> Result<Self, ConstructError> {
            Ok(Listed)
        }
    }

    struct BadMetadata;
    impl Mod for BadMetadata {}
    impl ModEntry for BadMetadata {
        fn descriptor() -> ModDescriptor {
            panic!("descriptor unavailable")
        }
        fn construct() -> Result<Self, ConstructError> {
            Ok(BadMetadata)
        }
    }

    #[test]
    fn skips_plain_types_and_reports_unknown_ones() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("pack.zip");
        ZipFixture::new()
            .stored("mods/Listed.unit", b"")
            .stored("mods/Helper.unit", b"")
            .stored("mods/Missing.unit", b"")
            .stored("mods/Broken.unit", b"")
            .write_to(&archive)
            .unwrap();
        let manifest = ModManifest::new()
            .with::<Listed>("mods::Listed")
            .with_plain("mods::Helper")
            .with::<BadMetadata>("mods::Broken");

        let mut report = LoadReport::default();
        let candidates = classify(
            &[archive.clone()],
            &manifest,
            &ProgressReporter::disabled(),
            &mut report,
        )
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].descriptor.id, "listed");
        assert_eq!(candidates[0].type_name, "mods::Listed");
        assert_eq!(candidates[0].wants, vec![InstanceRequest::own("me")]);
        assert_eq!(candidates[0].archive, archive);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.issues().len(), 2);
        assert!(report
            .issues()
            .iter()
            .all(|issue| matches!(issue, ModLoadIssue::CodeResolution { .. })));
    }

    #[test]
    fn corrupt_archive_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("a-broken.zip");
        std::fs::write(&broken, b"PK but not really").unwrap();
        let good = dir.path().join("b-good.zip");
        ZipFixture::new()
            .stored("mods/Listed.unit", b"")
            .write_to(&good)
            .unwrap();
        let manifest = ModManifest::new().with::<Listed>("mods::Listed");

        let mut report = LoadReport::default();
        let candidates = classify(
            &[broken.clone(), good],
            &manifest,
            &ProgressReporter::disabled(),
            &mut report,
        )
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert!(matches!(
            &report.issues()[0],
            ModLoadIssue::ArchiveRead { archive, .. } if *archive == broken
        ));
    }
}
