//! Constructing candidates and admitting them into the registry.

use crate::classifier::LoadCandidate;
use crate::error::{LoadReport, ModLoadIssue};
use crate::progress::ProgressReporter;
use crate::registry::{ModRecord, Registry};
use mod_api::{is_self_reference, ConstructError, ModInstance, Version};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info};

/// Constructs each candidate in order and appends the survivors to
/// `registry`.
///
/// A candidate is dropped when its constructor fails or panics, when it
/// claims the reserved self-reference id, or when a mod with the same id
/// and version is already registered. Mods that do not list `host_version`
/// are still registered, with a warning.
pub fn instantiate(
    candidates: Vec<LoadCandidate>,
    host_version: &Version,
    registry: &mut Registry,
    progress: &ProgressReporter,
    report: &mut LoadReport,
) {
    let total = candidates.len();
    for (index, candidate) in candidates.into_iter().enumerate() {
        progress.step(&candidate.descriptor.name, index + 1, total);

        let construct = candidate.declaration.construct;
        let instance: ModInstance = match catch_unwind(AssertUnwindSafe(construct)) {
            Ok(Ok(instance)) => Arc::from(instance),
            Ok(Err(e)) => {
                reject_construction(&candidate, e, report);
                continue;
            }
            Err(payload) => {
                reject_construction(&candidate, ConstructError::from_panic(payload), report);
                continue;
            }
        };

        let LoadCandidate {
            archive,
            type_name,
            descriptor,
            wants,
            keep_alive,
            ..
        } = candidate;

        if is_self_reference(&descriptor.id) {
            drop(instance);
            report.record(ModLoadIssue::ReservedIdentifier {
                mod_id: descriptor.id,
                type_name,
                archive,
            });
            continue;
        }

        if registry.contains(&descriptor.id, &descriptor.version) {
            drop(instance);
            report.record(ModLoadIssue::DuplicateIdentity {
                mod_id: descriptor.id,
                version: descriptor.version,
                archive,
            });
            continue;
        }

        let supported = descriptor.supports_host(host_version);
        let mod_id = descriptor.id.clone();
        info!(
            target: "mod_loader",
            mod_id = %mod_id,
            version = %descriptor.version,
            "Constructed mod {}",
            descriptor.name
        );
        debug!(target: "mod_loader", mod_id = %mod_id, "Registered from {}", archive.display());
        registry.push(
            ModRecord::new(descriptor, instance, archive, type_name, wants),
            keep_alive,
        );

        if !supported {
            report.record(ModLoadIssue::VersionCompatibility {
                mod_id,
                host_version: host_version.clone(),
            });
        }
    }
}

fn reject_construction(candidate: &LoadCandidate, error: ConstructError, report: &mut LoadReport) {
    report.record(ModLoadIssue::Construction {
        mod_id: candidate.descriptor.id.clone(),
        type_name: candidate.type_name.clone(),
        details: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mod_api::{InstanceRequest, Mod, ModDeclaration, ModDescriptor, ModEntry};
    use std::path::PathBuf;

    macro_rules! test_mod {
        ($name:ident, $id:expr, $version:expr) => {
            struct $name;
            impl Mod for $name {}
            impl ModEntry for $name {
                fn descriptor() -> ModDescriptor {
                    ModDescriptor::new($id, $version).supports([0, 3])
                }
                fn construct() -> Result<Self, ConstructError> {
                    Ok($name)
                }
            }
        };
    }

    test_mod!(Alpha, "alpha", [1, 0]);
    test_mod!(AlphaAgain, "ALPHA", [1, 0]);
    test_mod!(Reserved, "this", [1, 0]);

    struct Failing;
    impl Mod for Failing {}
    impl ModEntry for Failing {
        fn descriptor() -> ModDescriptor {
            ModDescriptor::new("failing", [1])
        }
        fn construct() -> Result<Self, ConstructError> {
            Err(ConstructError::failed("missing config"))
        }
    }

    struct Panicking;
    impl Mod for Panicking {}
    impl ModEntry for Panicking {
        fn descriptor() -> ModDescriptor {
            ModDescriptor::new("panicking", [1])
        }
        fn construct() -> Result<Self, ConstructError> {
            panic!("constructor exploded")
        }
    }

    struct Unsupported;
    impl Mod for Unsupported {}
    impl ModEntry for Unsupported {
        fn descriptor() -> ModDescriptor {
            ModDescriptor::new("old", [1]).supports([0, 1])
        }
        fn construct() -> Result<Self, ConstructError> {
            Ok(Unsupported)
        }
    }

    fn candidate<T: ModEntry>(type_name: &str) -> LoadCandidate {
        let declaration = ModDeclaration::of::<T>();
        LoadCandidate {
            archive: PathBuf::from("mods.zip"),
            type_name: type_name.to_string(),
            descriptor: (declaration.descriptor)(),
            wants: Vec::<InstanceRequest>::new(),
            declaration,
            keep_alive: None,
        }
    }

    fn run(candidates: Vec<LoadCandidate>) -> (Registry, LoadReport) {
        let mut registry = Registry::new();
        let mut report = LoadReport::default();
        instantiate(
            candidates,
            &Version::from([0, 3]),
            &mut registry,
            &ProgressReporter::disabled(),
            &mut report,
        );
        (registry, report)
    }

    #[test]
    fn first_of_equal_identities_wins() {
        let (registry, report) = run(vec![
            candidate::<Alpha>("mods::Alpha"),
            candidate::<AlphaAgain>("mods::AlphaAgain"),
        ]);

        assert_eq!(registry.len(), 1);
        assert!(registry.records()[0].instance().is::<Alpha>());
        assert!(matches!(
            report.issues(),
            [ModLoadIssue::DuplicateIdentity { .. }]
        ));
    }

    #[test]
    fn reserved_id_is_rejected() {
        let (registry, report) = run(vec![candidate::<Reserved>("mods::Reserved")]);
        assert!(registry.is_empty());
        assert!(matches!(
            report.issues(),
            [ModLoadIssue::ReservedIdentifier { mod_id, .. }] if mod_id == "this"
        ));
    }

    #[test]
    fn failed_constructors_skip_only_their_mod() {
        let (registry, report) = run(vec![
            candidate::<Alpha>("mods::Alpha"),
            candidate::<Failing>("mods::Failing"),
            candidate::<Panicking>("mods::Panicking"),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(report.issues().len(), 2);
        assert!(report
            .issues()
            .iter()
            .all(|issue| matches!(issue, ModLoadIssue::Construction { .. })));
    }

    #[test]
    fn unsupported_host_version_still_loads() {
        let (registry, report) = run(vec![candidate::<Unsupported>("mods::Unsupported")]);
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            report.issues(),
            [ModLoadIssue::VersionCompatibility { .. }]
        ));
    }
}
