//! The loader facade driving one boot-time load.

use crate::classifier;
use crate::code::CodeLoader;
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadReport};
use crate::inject;
use crate::instantiate;
use crate::lifecycle;
use crate::ordering;
use crate::progress::{stage, LoadingEvent, ProgressReporter};
use crate::registry::{ModRecord, Registry};
use crate::resources::{self, ResourceStager};
use crate::scanner;
use mod_api::EventBus;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Loads mods once and keeps them for the rest of the process.
///
/// The pipeline runs stage by stage: find archives, resolve their mod
/// types, sort, construct, resolve instance requests, subscribe the mods
/// to the bus, then publish pre-init, init and post-init.
///
/// Mods may register their own handlers on the bus. Those handlers can be
/// code from a mod library, so drop the bus before the loader.
///
/// ```rust,no_run
/// use mod_api::EventBus;
/// use mod_loader::{DylibLoader, LoaderConfig, ModLoader};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let events = Arc::new(EventBus::new());
/// let mut loader = ModLoader::new(LoaderConfig::new([0, 3]), events);
/// let report = loader.load(Path::new("mods"), &DylibLoader::new()).unwrap();
/// println!("{} issue(s)", report.issues().len());
/// for record in loader.mods() {
///     println!("{} {}", record.id(), record.version());
/// }
/// ```
pub struct ModLoader {
    config: LoaderConfig,
    events: Arc<EventBus>,
    progress: ProgressReporter,
    report: LoadReport,
    loaded: bool,
    registry: Registry,
}

impl ModLoader {
    pub fn new(config: LoaderConfig, events: Arc<EventBus>) -> Self {
        Self {
            config,
            events,
            progress: ProgressReporter::disabled(),
            report: LoadReport::default(),
            loaded: false,
            registry: Registry::new(),
        }
    }

    /// Sends progress of the load to `sender`. The sender is dropped when
    /// [`ModLoader::load`] returns.
    pub fn with_progress(mut self, sender: broadcast::Sender<LoadingEvent>) -> Self {
        self.progress = ProgressReporter::new(sender);
        self
    }

    /// Runs the full pipeline against `mods_dir`.
    ///
    /// Only configuration problems, a code context that cannot be opened and
    /// lifecycle listener failures abort the load; everything else ends up
    /// in the returned report. Fails with [`LoadError::AlreadyLoaded`] on
    /// every call after the first one that got past config validation.
    pub fn load(
        &mut self,
        mods_dir: &Path,
        code: &dyn CodeLoader,
    ) -> Result<&LoadReport, LoadError> {
        if self.loaded {
            return Err(LoadError::AlreadyLoaded);
        }
        self.config.validate().map_err(LoadError::Config)?;
        self.loaded = true;
        // Dropped on return, which closes the progress channel.
        let progress = std::mem::take(&mut self.progress);

        info!(target: "mod_loader", "Loading mods from {}", mods_dir.display());

        progress.stage(stage::FINDING_MODS, true);
        let archives =
            scanner::discover_archives(mods_dir, &self.config.archive_suffixes, &mut self.report);
        self.report.archives_scanned = archives.len();
        let mut candidates = classifier::classify(&archives, code, &progress, &mut self.report)
            .map_err(LoadError::CodeContext)?;

        ordering::sort_candidates(&mut candidates);
        info!(target: "mod_loader", "Found {} mod candidate(s)", candidates.len());

        progress.stage(stage::CONSTRUCTING_MODS, true);
        instantiate::instantiate(
            candidates,
            &self.config.host_version,
            &mut self.registry,
            &progress,
            &mut self.report,
        );
        self.report.loaded = self.registry.len();

        progress.stage(stage::DISPATCHING_INSTANCES, false);
        inject::inject_instances(&self.registry, &mut self.report);

        progress.stage(stage::REGISTERING_INITIALIZER, false);
        lifecycle::register_listeners(&self.registry, &self.events)
            .map_err(LoadError::Subscription)?;

        lifecycle::broadcast(
            &self.events,
            &self.config.host_version,
            self.registry.len(),
            &progress,
        )?;

        info!(
            target: "mod_loader",
            "Mod loading finished with {} mod(s) loaded",
            self.registry.len()
        );
        Ok(&self.report)
    }

    /// Loaded mods, in instantiation order.
    pub fn mods(&self) -> &[ModRecord] {
        self.registry.records()
    }

    /// The first loaded mod with id `id`, ignoring case.
    pub fn get_mod(&self, id: &str) -> Option<&ModRecord> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Stages every loaded mod's resources at `priority`.
    pub fn stage_mod_resources(&self, stager: &mut dyn ResourceStager, priority: i32) {
        resources::stage_mod_resources(&self.registry, stager, priority);
    }
}

impl std::fmt::Debug for ModLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModLoader")
            .field("config", &self.config)
            .field("loaded", &self.loaded)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ModManifest;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn second_load_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ModLoader::new(LoaderConfig::new([0, 3]), Arc::new(EventBus::new()));
        let manifest = ModManifest::new();

        let report = loader.load(dir.path(), &manifest).unwrap();
        assert_eq!(report.archives_scanned, 0);
        assert!(loader.is_loaded());
        assert!(matches!(
            loader.load(dir.path(), &manifest),
            Err(LoadError::AlreadyLoaded)
        ));
    }

    #[test]
    fn invalid_config_aborts_without_marking_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoaderConfig::new([0, 3]).with_archive_suffixes(["tar.gz"]);
        let (sender, mut receiver) = crate::progress::channel(8);
        let mut loader = ModLoader::new(config, Arc::new(EventBus::new())).with_progress(sender);

        for _ in 0..2 {
            assert!(matches!(
                loader.load(dir.path(), &ModManifest::new()),
                Err(LoadError::Config(_))
            ));
        }
        assert!(!loader.is_loaded());
        // The reporter is still held for a later attempt.
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn empty_load_still_reports_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, mut receiver) = crate::progress::channel(32);
        let mut loader = ModLoader::new(LoaderConfig::new([0, 3]), Arc::new(EventBus::new()))
            .with_progress(sender);

        loader.load(dir.path(), &ModManifest::new()).unwrap();

        let mut labels = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let LoadingEvent::Stage { label, .. } = event {
                labels.push(label);
            }
        }
        assert_eq!(
            labels,
            vec![
                stage::FINDING_MODS,
                stage::CONSTRUCTING_MODS,
                stage::DISPATCHING_INSTANCES,
                stage::REGISTERING_INITIALIZER,
                stage::PRE_INITIALIZING_MODS,
                stage::INITIALIZING_MODS,
                stage::POST_INITIALIZING_MODS,
            ]
        );
    }
}
