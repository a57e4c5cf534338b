//! Lifecycle listener registration and the three-stage broadcast.

use crate::error::LoadError;
use crate::progress::{stage, ProgressReporter};
use crate::registry::Registry;
use mod_api::{
    Event, EventBus, EventError, Mod, ModInitEvent, ModInstance, ModPostInitEvent, ModPreInitEvent,
    Version, MOD_INIT, MOD_POST_INIT, MOD_PRE_INIT,
};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    PreInit,
    Init,
    PostInit,
}

impl LifecycleStage {
    /// Every stage, in broadcast order.
    pub const ALL: [LifecycleStage; 3] = [Self::PreInit, Self::Init, Self::PostInit];

    /// Name of the `core:` event that carries this stage.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::PreInit => MOD_PRE_INIT,
            Self::Init => MOD_INIT,
            Self::PostInit => MOD_POST_INIT,
        }
    }

    /// Progress label shown while this stage runs.
    pub fn label(self) -> &'static str {
        match self {
            Self::PreInit => stage::PRE_INITIALIZING_MODS,
            Self::Init => stage::INITIALIZING_MODS,
            Self::PostInit => stage::POST_INITIALIZING_MODS,
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreInit => f.write_str("pre-initialization"),
            Self::Init => f.write_str("initialization"),
            Self::PostInit => f.write_str("post-initialization"),
        }
    }
}

/// Subscribes every registered mod to the three lifecycle events.
///
/// Listeners hold only weak references to the mod and the bus.
pub fn register_listeners(registry: &Registry, events: &Arc<EventBus>) -> Result<(), EventError> {
    for record in registry {
        let instance = record.instance();
        let mod_id = record.id();
        subscribe(events, LifecycleStage::PreInit, mod_id, instance, |m, e: &ModPreInitEvent, bus| {
            m.pre_init(e, bus)
        })?;
        subscribe(events, LifecycleStage::Init, mod_id, instance, |m, e: &ModInitEvent, bus| {
            m.init(e, bus)
        })?;
        subscribe(
            events,
            LifecycleStage::PostInit,
            mod_id,
            instance,
            |m, e: &ModPostInitEvent, bus| m.post_init(e, bus),
        )?;
        debug!(target: "mod_loader", mod_id = %mod_id, "Registered lifecycle listeners");
    }
    Ok(())
}

fn subscribe<E>(
    events: &Arc<EventBus>,
    stage: LifecycleStage,
    mod_id: &str,
    instance: &ModInstance,
    call: fn(&dyn Mod, &E, &EventBus) -> Result<(), EventError>,
) -> Result<(), EventError>
where
    E: Event + 'static,
{
    let instance: Weak<dyn Mod> = Arc::downgrade(instance);
    let bus: Weak<EventBus> = Arc::downgrade(events);
    let mod_id = mod_id.to_string();
    events.on_core(stage.event_name(), move |event: E| {
        let (Some(instance), Some(bus)) = (instance.upgrade(), bus.upgrade()) else {
            debug!(target: "mod_loader", mod_id = %mod_id, "Skipping {} of dropped mod", stage);
            return Ok(());
        };
        call(instance.as_ref(), &event, &bus).map_err(|e| {
            error!(target: "mod_loader", mod_id = %mod_id, "Mod failed during {}: {}", stage, e);
            e
        })
    })
}

/// Publishes pre-init, init and post-init, in that order, each once.
///
/// The first listener failure stops the broadcast.
pub fn broadcast(
    events: &EventBus,
    host_version: &Version,
    mod_count: usize,
    progress: &ProgressReporter,
) -> Result<(), LoadError> {
    for stage in LifecycleStage::ALL {
        progress.stage(stage.label(), false);
        info!(target: "mod_loader", "Running {} of {} mod(s)", stage, mod_count);
        let host_version = host_version.clone();
        let result = match stage {
            LifecycleStage::PreInit => events.emit_core(
                stage.event_name(),
                &ModPreInitEvent {
                    host_version,
                    mod_count,
                },
            ),
            LifecycleStage::Init => events.emit_core(
                stage.event_name(),
                &ModInitEvent {
                    host_version,
                    mod_count,
                },
            ),
            LifecycleStage::PostInit => events.emit_core(
                stage.event_name(),
                &ModPostInitEvent {
                    host_version,
                    mod_count,
                },
            ),
        };
        result.map_err(|source| LoadError::Lifecycle { stage, source })?;
    }
    Ok(())
}
