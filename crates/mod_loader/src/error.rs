//! Error types and the load report.
//!
//! Almost nothing stops a load: each per-archive, per-candidate or
//! per-request failure becomes a [`ModLoadIssue`] in the [`LoadReport`] and
//! the loader moves on. Only [`LoadError`] aborts.

use crate::lifecycle::LifecycleStage;
use mod_api::{EventError, InjectError, Version};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Failures raised by a code-loading context.
#[derive(Debug, Error)]
pub enum CodeError {
    #[error("could not prepare code context: {0}")]
    Context(String),
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not load `{type_name}`: {details}")]
    Load { type_name: String, details: String },
    #[error("`{type_name}` was built against mod API {found}, host provides {expected}")]
    ApiMismatch {
        type_name: String,
        found: String,
        expected: &'static str,
    },
    #[error("unknown type `{type_name}`")]
    Unknown { type_name: String },
}

impl CodeError {
    pub fn load(type_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Load {
            type_name: type_name.into(),
            details: details.into(),
        }
    }

    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

/// Why an instance request was left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionProblem {
    #[error("could not find mod `{target_id}`")]
    TargetNotFound { target_id: String },
    #[error("mod `{target_id}` is version {found}, version {required} was requested")]
    VersionMismatch {
        target_id: String,
        required: Version,
        found: Version,
    },
    #[error("mod `{target_id}` is not accessible")]
    Inaccessible { target_id: String },
    #[error("instance was rejected: {0}")]
    Rejected(#[from] InjectError),
}

/// A non-fatal problem met while loading mods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModLoadIssue {
    #[error("could not read `{path}` while searching for mods: {details}")]
    Discovery { path: PathBuf, details: String },
    #[error("could not read mod archive `{archive}`: {details}")]
    ArchiveRead { archive: PathBuf, details: String },
    #[error("could not resolve `{type_name}` in `{archive}`: {details}")]
    CodeResolution {
        archive: PathBuf,
        type_name: String,
        details: String,
    },
    #[error("could not construct mod `{mod_id}` ({type_name}): {details}")]
    Construction {
        mod_id: String,
        type_name: String,
        details: String,
    },
    #[error("mod `{mod_id}` version {version} from `{archive}` is already loaded")]
    DuplicateIdentity {
        mod_id: String,
        version: Version,
        archive: PathBuf,
    },
    #[error("mod {type_name} in `{archive}` uses the reserved id `{mod_id}`")]
    ReservedIdentifier {
        mod_id: String,
        type_name: String,
        archive: PathBuf,
    },
    #[error("mod `{mod_id}` does not declare support for host version {host_version}")]
    VersionCompatibility { mod_id: String, host_version: Version },
    #[error("mod `{mod_id}` slot `{slot}`: {problem}")]
    InjectionResolution {
        mod_id: String,
        slot: String,
        problem: InjectionProblem,
    },
}

impl ModLoadIssue {
    /// Mod id the issue concerns, when one is known.
    pub fn mod_id(&self) -> Option<&str> {
        match self {
            Self::Construction { mod_id, .. }
            | Self::DuplicateIdentity { mod_id, .. }
            | Self::ReservedIdentifier { mod_id, .. }
            | Self::VersionCompatibility { mod_id, .. }
            | Self::InjectionResolution { mod_id, .. } => Some(mod_id),
            Self::Discovery { .. } | Self::ArchiveRead { .. } | Self::CodeResolution { .. } => None,
        }
    }

    /// True for issues that cost a mod its place in the registry.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ArchiveRead { .. }
                | Self::CodeResolution { .. }
                | Self::Construction { .. }
                | Self::DuplicateIdentity { .. }
                | Self::ReservedIdentifier { .. }
        )
    }

    fn log(&self) {
        match self {
            Self::DuplicateIdentity { mod_id, .. } => {
                info!(target: "mod_loader", mod_id = %mod_id, "{}", self)
            }
            Self::Discovery { .. }
            | Self::VersionCompatibility { .. }
            | Self::InjectionResolution { .. } => warn!(target: "mod_loader", "{}", self),
            Self::ArchiveRead { archive, .. } | Self::CodeResolution { archive, .. } => {
                error!(target: "mod_loader", archive = %archive.display(), "{}", self)
            }
            Self::Construction { mod_id, .. } | Self::ReservedIdentifier { mod_id, .. } => {
                error!(target: "mod_loader", mod_id = %mod_id, "{}", self)
            }
        }
    }
}

/// Fatal load failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("mods have already been loaded")]
    AlreadyLoaded,
    #[error("invalid loader configuration: {0}")]
    Config(String),
    #[error("could not open code context: {0}")]
    CodeContext(#[source] CodeError),
    #[error("could not register lifecycle listeners: {0}")]
    Subscription(#[source] EventError),
    #[error("{stage} failed: {source}")]
    Lifecycle {
        stage: LifecycleStage,
        #[source]
        source: EventError,
    },
}

/// Outcome of a load: counters plus every issue met on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Archives found by the scanner
    pub archives_scanned: usize,
    /// Mod types found inside those archives
    pub candidates: usize,
    /// Mods that made it into the registry
    pub loaded: usize,
    issues: Vec<ModLoadIssue>,
}

impl LoadReport {
    /// Logs `issue` at its severity and keeps it.
    pub fn record(&mut self, issue: ModLoadIssue) {
        issue.log();
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[ModLoadIssue] {
        &self.issues
    }

    /// Issues concerning the mod `mod_id`, compared ignoring case.
    pub fn issues_for<'a>(&'a self, mod_id: &'a str) -> impl Iterator<Item = &'a ModLoadIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.mod_id().is_some_and(|id| mod_api::ids_match(id, mod_id)))
    }

    pub fn rejections(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_rejection()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_keeps_issues_in_order() {
        let mut report = LoadReport::default();
        report.record(ModLoadIssue::VersionCompatibility {
            mod_id: "Alpha".to_string(),
            host_version: Version::from([0, 3]),
        });
        report.record(ModLoadIssue::ArchiveRead {
            archive: PathBuf::from("mods/broken.zip"),
            details: "truncated".to_string(),
        });

        assert_eq!(report.issues().len(), 2);
        assert_eq!(report.issues_for("alpha").count(), 1);
        assert_eq!(report.rejections(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn injection_problem_wraps_setter_error() {
        let problem: InjectionProblem = InjectError::UnknownSlot {
            slot: "dep".to_string(),
        }
        .into();
        assert!(problem.to_string().contains("dep"));
    }
}
