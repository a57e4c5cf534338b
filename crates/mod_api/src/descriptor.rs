//! Declarative metadata a mod attaches to its entry type.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Reserved id that instance requests use to ask for their own instance.
///
/// No mod may declare this as its id.
pub const SELF_INSTANCE_ID: &str = "this";

/// Compares two mod ids ignoring case.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Returns true when two mod ids name the same mod.
pub fn ids_match(a: &str, b: &str) -> bool {
    compare_ids(a, b) == Ordering::Equal
}

/// Returns true when `id` is the reserved self-reference sentinel.
pub fn is_self_reference(id: &str) -> bool {
    ids_match(id, SELF_INSTANCE_ID)
}

/// Identity and packaging metadata of a mod.
///
/// # Examples
///
/// ```rust
/// use mod_api::{ModDescriptor, Version};
///
/// let descriptor = ModDescriptor::new("alpha", [1, 0])
///     .with_name("Alpha")
///     .with_resource_location("assets/alpha")
///     .supports([0, 3]);
/// assert_eq!(descriptor.version, Version::from([1, 0]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDescriptor {
    /// Globally unique, case-insensitive identifier
    pub id: String,
    /// Human readable name used in progress reporting
    pub name: String,
    pub version: Version,
    /// Directory inside the archive holding the mod's resources
    #[serde(default)]
    pub resource_location: String,
    /// Host versions this mod declares support for
    #[serde(default)]
    pub host_versions: Vec<Version>,
    /// Whether other mods may obtain a reference to this mod's instance
    #[serde(default = "default_accessible")]
    pub accessible: bool,
}

fn default_accessible() -> bool {
    true
}

impl ModDescriptor {
    /// Creates a descriptor whose display name defaults to its id.
    pub fn new(id: impl Into<String>, version: impl Into<Version>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: version.into(),
            resource_location: String::new(),
            host_versions: Vec::new(),
            accessible: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_resource_location(mut self, location: impl Into<String>) -> Self {
        self.resource_location = location.into();
        self
    }

    /// Adds a host version to the declared support set.
    pub fn supports(mut self, host_version: impl Into<Version>) -> Self {
        self.host_versions.push(host_version.into());
        self
    }

    /// Hides this mod's instance from other mods' instance requests.
    pub fn private(mut self) -> Self {
        self.accessible = false;
        self
    }

    pub fn supports_host(&self, host_version: &Version) -> bool {
        self.host_versions.iter().any(|v| v == host_version)
    }
}

/// A mod's declared need for a reference to another mod's instance.
///
/// The loader resolves each request once, after every mod has been
/// constructed, and hands the result to [`crate::Mod::inject`] under `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRequest {
    /// Name of the receiving slot on the requesting mod
    pub slot: String,
    /// Id of the wanted mod, or [`SELF_INSTANCE_ID`]
    pub target_id: String,
    /// Exact version the target must have; empty accepts any version
    #[serde(default)]
    pub required_version: Version,
}

impl InstanceRequest {
    /// Requests the requesting mod's own instance.
    pub fn own(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            target_id: SELF_INSTANCE_ID.to_string(),
            required_version: Version::any(),
        }
    }

    /// Requests the instance of the mod with id `target_id`, any version.
    pub fn of(slot: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            target_id: target_id.into(),
            required_version: Version::any(),
        }
    }

    pub fn with_version(mut self, version: impl Into<Version>) -> Self {
        self.required_version = version.into();
        self
    }

    pub fn is_self_reference(&self) -> bool {
        is_self_reference(&self.target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_case_insensitively() {
        assert!(ids_match("Alpha", "alpha"));
        assert_eq!(compare_ids("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_ids("GAMMA", "beta"), Ordering::Greater);
        assert!(is_self_reference("THIS"));
    }

    #[test]
    fn descriptor_defaults_to_accessible() {
        let descriptor = ModDescriptor::new("alpha", [1, 0]);
        assert!(descriptor.accessible);
        assert_eq!(descriptor.name, "alpha");
        assert!(!descriptor.clone().private().accessible);
    }

    #[test]
    fn host_support_requires_exact_version() {
        let descriptor = ModDescriptor::new("alpha", [1, 0]).supports([0, 3]);
        assert!(descriptor.supports_host(&Version::from([0, 3])));
        assert!(!descriptor.supports_host(&Version::from([0, 3, 0])));
    }

    #[test]
    fn own_request_targets_sentinel() {
        let request = InstanceRequest::own("me");
        assert!(request.is_self_reference());
        assert!(request.required_version.is_empty());
        assert!(!InstanceRequest::of("dep", "alpha").is_self_reference());
    }
}
