//! Resolving instance requests between loaded mods.

use crate::error::{InjectionProblem, LoadReport, ModLoadIssue};
use crate::registry::{ModRecord, Registry};
use mod_api::{ids_match, InstanceRequest, ModInstance};
use tracing::debug;

/// Resolves every instance request of every registered mod and hands the
/// result to the requesting mod's [`mod_api::Mod::inject`].
///
/// Each unresolved or rejected request is reported on its own; the
/// remaining requests are still processed.
pub fn inject_instances(registry: &Registry, report: &mut LoadReport) {
    for (owner_index, owner) in registry.iter().enumerate() {
        for request in owner.wants() {
            let outcome = resolve(registry, owner_index, owner, request).and_then(|instance| {
                owner
                    .instance()
                    .inject(&request.slot, instance)
                    .map_err(InjectionProblem::from)
            });

            match outcome {
                Ok(()) => debug!(
                    target: "mod_loader",
                    mod_id = %owner.id(),
                    "Injected `{}` into slot `{}`",
                    request.target_id,
                    request.slot
                ),
                Err(problem) => report.record(ModLoadIssue::InjectionResolution {
                    mod_id: owner.id().to_string(),
                    slot: request.slot.clone(),
                    problem,
                }),
            }
        }
    }
}

/// Finds the instance `request` asks for.
///
/// Only the first other mod with a matching id is considered; a version
/// mismatch there does not fall through to later mods.
fn resolve(
    registry: &Registry,
    owner_index: usize,
    owner: &ModRecord,
    request: &InstanceRequest,
) -> Result<ModInstance, InjectionProblem> {
    if request.is_self_reference() || ids_match(&request.target_id, owner.id()) {
        return Ok(owner.instance().clone());
    }

    let target = registry
        .iter()
        .enumerate()
        .find(|(index, record)| *index != owner_index && ids_match(record.id(), &request.target_id))
        .map(|(_, record)| record)
        .ok_or_else(|| InjectionProblem::TargetNotFound {
            target_id: request.target_id.clone(),
        })?;

    if !request.required_version.is_empty() && request.required_version != *target.version() {
        return Err(InjectionProblem::VersionMismatch {
            target_id: request.target_id.clone(),
            required: request.required_version.clone(),
            found: target.version().clone(),
        });
    }

    if !target.descriptor().accessible {
        return Err(InjectionProblem::Inaccessible {
            target_id: request.target_id.clone(),
        });
    }

    Ok(target.instance().clone())
}
