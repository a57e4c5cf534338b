//! Boot-time mod loading.
//!
//! [`ModLoader`] finds mod archives under a directory, resolves the mod
//! types inside them through a [`CodeLoader`], constructs one instance per
//! mod, resolves the instance requests mods declare on each other, and
//! drives every instance through pre-init, init and post-init on the host
//! [`mod_api::EventBus`].
//!
//! Two code loaders are provided:
//!
//! - [`DylibLoader`] loads mods compiled as dynamic libraries that export
//!   themselves with [`mod_api::export_mod!`]
//! - [`ModManifest`] resolves mods linked into the host, named in archives
//!   by marker entries
//!
//! A broken mod never stops the load. Its problems are logged and kept in
//! the [`LoadReport`].

pub mod archive;
pub mod classifier;
pub mod code;
pub mod config;
pub mod error;
pub mod inject;
pub mod instantiate;
pub mod lifecycle;
pub mod loader;
pub mod ordering;
pub mod progress;
pub mod registry;
pub mod resources;
pub mod scanner;
#[doc(hidden)]
pub mod testing;

pub use classifier::LoadCandidate;
pub use code::{CodeContext, CodeLoader, DylibLoader, KeepAlive, ModManifest, ResolvedMod};
pub use config::LoaderConfig;
pub use error::{CodeError, InjectionProblem, LoadError, LoadReport, ModLoadIssue};
pub use lifecycle::LifecycleStage;
pub use loader::ModLoader;
pub use progress::{LoadingEvent, ProgressReporter};
pub use registry::{ModRecord, Registry};
pub use resources::{ResourceSource, ResourceStager};
