//! # Mod API
//!
//! The contract shared by the mod loader and every mod it loads.
//!
//! A mod is a type implementing [`ModEntry`]: it declares a
//! [`ModDescriptor`] (id, version, resources, supported host versions),
//! an optional list of [`InstanceRequest`]s for references to other mods,
//! and a no-argument constructor. The loader constructs every mod, resolves
//! the requests through [`Mod::inject`], and then drives all instances
//! through three lifecycle stages published on the host [`EventBus`]:
//!
//! 1. `core:mod_pre_init` → [`Mod::pre_init`]
//! 2. `core:mod_init` → [`Mod::init`]
//! 3. `core:mod_post_init` → [`Mod::post_init`]
//!
//! ## Writing a mod
//!
//! ```rust
//! use mod_api::*;
//!
//! struct GreeterMod {
//!     me: InstanceSlot<GreeterMod>,
//! }
//!
//! impl Mod for GreeterMod {
//!     fn inject(&self, slot: &str, instance: ModInstance) -> Result<(), InjectError> {
//!         match slot {
//!             "me" => self.me.set(instance),
//!             _ => Err(InjectError::UnknownSlot { slot: slot.to_string() }),
//!         }
//!     }
//!
//!     fn init(&self, event: &ModInitEvent, _events: &EventBus) -> Result<(), EventError> {
//!         println!("hello from host {}", event.host_version);
//!         Ok(())
//!     }
//! }
//!
//! impl ModEntry for GreeterMod {
//!     fn descriptor() -> ModDescriptor {
//!         ModDescriptor::new("greeter", [1, 0]).supports([0, 3])
//!     }
//!
//!     fn wants() -> Vec<InstanceRequest> {
//!         vec![InstanceRequest::own("me")]
//!     }
//!
//!     fn construct() -> Result<Self, ConstructError> {
//!         Ok(GreeterMod { me: InstanceSlot::new("me") })
//!     }
//! }
//! ```
//!
//! Compiled as a `cdylib`, a mod exports itself with
//! `mod_api::export_mod!(GreeterMod);`.

pub mod descriptor;
pub mod events;
pub mod plugin;
pub mod version;

pub use descriptor::{
    compare_ids, ids_match, is_self_reference, InstanceRequest, ModDescriptor, SELF_INSTANCE_ID,
};
pub use events::{
    Event, EventBus, EventBusStats, EventError, EventHandler, ModInitEvent, ModPostInitEvent,
    ModPreInitEvent, TypedEventHandler, MOD_INIT, MOD_POST_INIT, MOD_PRE_INIT,
};
pub use plugin::{
    AsAny, ConstructError, InjectError, InstanceSlot, Mod, ModDeclaration, ModEntry, ModInstance,
    MOD_API_VERSION, MOD_DECLARATION_SYMBOL,
};
pub use version::{ParseVersionError, Version};

// Re-exported so mods can use the bus without depending on serde directly.
pub use serde;
pub use serde_json;
