//! Instantiation order of load candidates.

use crate::classifier::LoadCandidate;
use mod_api::{compare_ids, ModDescriptor};
use std::cmp::Ordering;

/// Orders descriptors by id ignoring case, then by version.
pub fn compare_descriptors(a: &ModDescriptor, b: &ModDescriptor) -> Ordering {
    compare_ids(&a.id, &b.id).then_with(|| a.version.cmp(&b.version))
}

/// Sorts candidates into instantiation order. The sort is stable, so
/// candidates with the same identity keep their discovery order.
pub fn sort_candidates(candidates: &mut [LoadCandidate]) {
    candidates.sort_by(|a, b| compare_descriptors(&a.descriptor, &b.descriptor));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(specs: &[(&str, &[u64])]) -> Vec<ModDescriptor> {
        specs
            .iter()
            .map(|(id, version)| ModDescriptor::new(*id, *version))
            .collect()
    }

    #[test]
    fn sorts_by_id_then_version() {
        let mut mods = descriptors(&[
            ("beta", &[1, 0]),
            ("Alpha", &[2, 1, 0]),
            ("alpha", &[2, 1]),
            ("ALPHA", &[1, 9]),
        ]);
        mods.sort_by(compare_descriptors);

        let order: Vec<String> = mods
            .iter()
            .map(|d| format!("{}@{}", d.id, d.version))
            .collect();
        assert_eq!(order, vec!["ALPHA@1.9", "alpha@2.1", "Alpha@2.1.0", "beta@1.0"]);
    }

    #[test]
    fn equal_identities_keep_their_order() {
        let mut mods = descriptors(&[("gamma", &[1, 0]), ("Gamma", &[1, 0])]);
        mods.sort_by(compare_descriptors);
        assert_eq!(mods[0].id, "gamma");
        assert_eq!(mods[1].id, "Gamma");
    }
}
