//! The host application: configuration, one mod load, then idle until
//! shutdown.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::logging::setup_logging;
use crate::signals::wait_for_shutdown;
use crate::staging::ResourcePacks;
use mod_api::EventBus;
use mod_loader::progress::{self, LoadingEvent};
use mod_loader::{CodeLoader, DylibLoader, LoadError, LoaderConfig, ModLoader};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Progress events buffered for the renderer before it starts lagging.
const PROGRESS_CAPACITY: usize = 256;

pub struct Application {
    config: AppConfig,
    once: bool,
}

impl Application {
    /// Loads the configuration, applies CLI overrides and sets up logging.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        // Configuration comes before logging, so the level is known.
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(mods_dir) = args.mods_dir {
            config.mods.directory = mods_dir.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {}", e).into());
        }

        setup_logging(&config.logging)?;

        info!(
            "🚀 modhost v{} | Config: {} | Mods: {}",
            env!("CARGO_PKG_VERSION"),
            args.config_path.display(),
            config.mods.directory
        );

        Ok(Self {
            config,
            once: args.once,
        })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("📋 Configuration Summary:");
        info!("  🏷️ Host version: {}", self.config.mods.host_version);
        info!("  📂 Mods directory: {}", self.config.mods.directory);
        info!(
            "  🗜️ Archive suffixes: {}",
            self.config.mods.archive_suffixes.join(", ")
        );

        let events = Arc::new(EventBus::new());
        let (sender, receiver) = progress::channel(PROGRESS_CAPACITY);
        let progress_handle = tokio::spawn(render_progress(receiver));

        // Mod code runs synchronously during the load.
        let (loader, outcome) = {
            let loader_config = self.config.to_loader_config();
            let mods_dir = self.config.mods_directory();
            let events = events.clone();
            tokio::task::spawn_blocking(move || {
                load_mods(loader_config, events, &mods_dir, &DylibLoader::new(), sender)
            })
            .await?
        };
        progress_handle.await?;

        if let Err(e) = outcome {
            shutdown(events, loader);
            return Err(e.into());
        }

        let report = loader.report();
        info!(
            "✅ Loaded {} mod(s) from {} archive(s), {} issue(s)",
            report.loaded,
            report.archives_scanned,
            report.issues().len()
        );
        if report.rejections() > 0 {
            warn!("⚠️ {} mod(s) were rejected", report.rejections());
        }
        for record in loader.mods() {
            info!(
                "  🔌 {} {} ({}) from {}",
                record.id(),
                record.version(),
                record.name(),
                record.archive().display()
            );
        }

        let mut packs = ResourcePacks::new();
        loader.stage_mod_resources(&mut packs, self.config.mods.resource_priority);
        if packs.is_empty() {
            info!("📦 No mod resources to stage");
        } else {
            info!("📦 {} resource source(s) staged", packs.len());
        }

        let stats = events.get_stats();
        info!(
            "📊 Event bus: {} handler(s), {} event(s) emitted",
            stats.total_handlers, stats.events_emitted
        );

        if !self.once {
            info!("🛑 Press Ctrl+C to shut down");
            wait_for_shutdown().await?;
        }

        shutdown(events, loader);
        info!("👋 modhost shutdown complete");
        Ok(())
    }
}

/// Runs one full load of `mods_dir`.
///
/// The loader comes back even when the load fails. It still owns every
/// mod library opened before the failure.
pub fn load_mods(
    config: LoaderConfig,
    events: Arc<EventBus>,
    mods_dir: &Path,
    code: &dyn CodeLoader,
    progress: broadcast::Sender<LoadingEvent>,
) -> (ModLoader, Result<(), LoadError>) {
    let mut loader = ModLoader::new(config, events).with_progress(progress);
    let outcome = loader.load(mods_dir, code).map(|_| ());
    (loader, outcome)
}

/// Releases the bus before the loader. Handlers may live in mod
/// libraries, which the loader unloads.
fn shutdown(events: Arc<EventBus>, loader: ModLoader) {
    drop(events);
    drop(loader);
}

/// Logs progress events until the loader drops its sender. Returns the
/// number of stages seen.
async fn render_progress(mut receiver: broadcast::Receiver<LoadingEvent>) -> usize {
    let mut stages = 0;
    loop {
        match receiver.recv().await {
            Ok(LoadingEvent::Stage { label, .. }) => {
                stages += 1;
                info!("⏳ {}", label);
            }
            Ok(LoadingEvent::Step {
                label,
                current,
                total,
            }) => {
                debug!("  [{}/{}] {}", current, total, label);
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!("Progress display skipped {} event(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use mod_api::{
        ConstructError, EventError, Mod, ModDescriptor, ModEntry, ModInitEvent, MOD_INIT,
    };
    use mod_loader::testing::ZipFixture;
    use mod_loader::ModManifest;

    struct QuietMod;

    impl Mod for QuietMod {}

    impl ModEntry for QuietMod {
        fn descriptor() -> ModDescriptor {
            ModDescriptor::new("quiet", [1, 0]).supports([0, 3])
        }

        fn construct() -> Result<Self, ConstructError> {
            Ok(QuietMod)
        }
    }

    #[tokio::test]
    async fn empty_directory_loads_nothing_and_closes_progress() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(EventBus::new());
        let (sender, receiver) = progress::channel(PROGRESS_CAPACITY);
        let progress_handle = tokio::spawn(render_progress(receiver));

        let (loader, outcome) = load_mods(
            LoaderConfig::new([0, 3]),
            events.clone(),
            dir.path(),
            &ModManifest::new(),
            sender,
        );
        outcome.unwrap();

        assert_eq!(progress_handle.await.unwrap(), 7);
        assert!(loader.mods().is_empty());
        assert!(loader.report().is_clean());
        assert_eq!(events.get_stats().events_emitted, 3);
    }

    #[tokio::test]
    async fn dylib_loader_accepts_empty_mods_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mods_dir = dir.path().join("mods");
        std::fs::create_dir(&mods_dir).unwrap();

        let config = AppConfig::default();
        let (sender, _receiver) = progress::channel(PROGRESS_CAPACITY);
        let (loader, outcome) = load_mods(
            config.to_loader_config(),
            Arc::new(EventBus::new()),
            &mods_dir,
            &DylibLoader::new(),
            sender,
        );
        outcome.unwrap();

        assert_eq!(loader.report().archives_scanned, 0);
        assert!(loader.is_loaded());
    }

    #[test]
    fn failed_load_still_returns_loaded_mods() {
        let dir = tempfile::tempdir().unwrap();
        ZipFixture::new()
            .stored("mods/Quiet.unit", b"")
            .write_to(&dir.path().join("quiet.zip"))
            .unwrap();
        let events = Arc::new(EventBus::new());
        events
            .on_core(MOD_INIT, |_: ModInitEvent| Err(EventError::handler("refused")))
            .unwrap();
        let (sender, _receiver) = progress::channel(PROGRESS_CAPACITY);

        let (loader, outcome) = load_mods(
            LoaderConfig::new([0, 3]),
            events.clone(),
            dir.path(),
            &ModManifest::new().with::<QuietMod>("mods::Quiet"),
            sender,
        );

        assert!(matches!(outcome, Err(LoadError::Lifecycle { .. })));
        assert_eq!(loader.mods().len(), 1);
        assert_eq!(loader.mods()[0].id(), "quiet");
        shutdown(events, loader);
    }
}
