//! The mod trait, its declaration, and the dynamic-library export macro.

use crate::descriptor::{InstanceRequest, ModDescriptor};
use crate::events::{EventBus, EventError, ModInitEvent, ModPostInitEvent, ModPreInitEvent};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// Version of this crate, checked against the version a dynamic mod was
/// built with before any of its code runs.
pub const MOD_API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the symbol [`export_mod!`] exports from a mod library.
pub const MOD_DECLARATION_SYMBOL: &[u8] = b"mod_declaration";

/// Shared handle to a live mod instance.
pub type ModInstance = Arc<dyn Mod>;

/// Upcast helper so `dyn Mod` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Errors a mod's constructor can report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConstructError {
    #[error("construction failed: {0}")]
    Failed(String),
    #[error("constructor panicked: {0}")]
    Panicked(String),
}

impl ConstructError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Turns a panic payload into a readable error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

/// Errors a mod's [`Mod::inject`] setter can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("no instance slot named `{slot}`")]
    UnknownSlot { slot: String },
    #[error("slot `{slot}` expects an instance of {expected}")]
    TypeMismatch { slot: String, expected: &'static str },
    #[error("slot `{slot}` is already assigned")]
    AlreadyAssigned { slot: String },
}

/// A loaded mod.
///
/// Instances are shared between the loader's registry and the slots of
/// other mods, so every method takes `&self`; keep mutable state behind
/// interior mutability.
///
/// The lifecycle methods are subscribed to the host bus by the loader and
/// called once each, in order, after all instance requests are resolved.
pub trait Mod: AsAny + Send + Sync {
    /// Receives the instance resolved for one of the entry type's
    /// [`ModEntry::wants`] requests.
    fn inject(&self, slot: &str, instance: ModInstance) -> Result<(), InjectError> {
        drop(instance);
        Err(InjectError::UnknownSlot {
            slot: slot.to_string(),
        })
    }

    fn pre_init(&self, _event: &ModPreInitEvent, _events: &EventBus) -> Result<(), EventError> {
        Ok(())
    }

    fn init(&self, _event: &ModInitEvent, _events: &EventBus) -> Result<(), EventError> {
        Ok(())
    }

    fn post_init(&self, _event: &ModPostInitEvent, _events: &EventBus) -> Result<(), EventError> {
        Ok(())
    }
}

impl dyn Mod {
    /// Returns true if this instance is a `T`.
    pub fn is<T: Mod>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Mod>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Mod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Mod")
    }
}

/// The entry type of a mod: its metadata plus a no-argument constructor.
///
/// ```rust
/// use mod_api::{ConstructError, InstanceRequest, InstanceSlot, InjectError, Mod, ModEntry,
///               ModDescriptor, ModInstance};
///
/// struct Beta {
///     alpha: InstanceSlot<Alpha>,
/// }
/// struct Alpha;
///
/// impl Mod for Alpha {}
/// impl Mod for Beta {
///     fn inject(&self, slot: &str, instance: ModInstance) -> Result<(), InjectError> {
///         match slot {
///             "alpha" => self.alpha.set(instance),
///             _ => Err(InjectError::UnknownSlot { slot: slot.to_string() }),
///         }
///     }
/// }
///
/// impl ModEntry for Beta {
///     fn descriptor() -> ModDescriptor {
///         ModDescriptor::new("beta", [1, 0])
///     }
///     fn wants() -> Vec<InstanceRequest> {
///         vec![InstanceRequest::of("alpha", "alpha")]
///     }
///     fn construct() -> Result<Self, ConstructError> {
///         Ok(Beta { alpha: InstanceSlot::new("alpha") })
///     }
/// }
/// ```
pub trait ModEntry: Mod + Sized {
    fn descriptor() -> ModDescriptor;

    fn wants() -> Vec<InstanceRequest> {
        Vec::new()
    }

    fn construct() -> Result<Self, ConstructError>;
}

/// Everything the loader needs from a mod entry type, as plain function
/// pointers so it can be handed across a dynamic-library boundary.
#[derive(Clone, Copy)]
pub struct ModDeclaration {
    pub api_version: &'static str,
    pub descriptor: fn() -> ModDescriptor,
    pub wants: fn() -> Vec<InstanceRequest>,
    pub construct: fn() -> Result<Box<dyn Mod>, ConstructError>,
}

impl ModDeclaration {
    pub fn of<T: ModEntry>() -> Self {
        Self {
            api_version: MOD_API_VERSION,
            descriptor: T::descriptor,
            wants: T::wants,
            construct: construct_boxed::<T>,
        }
    }
}

impl std::fmt::Debug for ModDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModDeclaration")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

fn construct_boxed<T: ModEntry>() -> Result<Box<dyn Mod>, ConstructError> {
    T::construct().map(|instance| Box::new(instance) as Box<dyn Mod>)
}

/// A write-once slot holding another mod's instance, typed by the
/// concrete mod it expects.
pub struct InstanceSlot<T> {
    name: &'static str,
    cell: OnceLock<ModInstance>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Mod> InstanceSlot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stores `instance` if it is a `T` and the slot is still empty.
    pub fn set(&self, instance: ModInstance) -> Result<(), InjectError> {
        if !instance.is::<T>() {
            return Err(InjectError::TypeMismatch {
                slot: self.name.to_string(),
                expected: std::any::type_name::<T>(),
            });
        }
        self.cell.set(instance).map_err(|_| InjectError::AlreadyAssigned {
            slot: self.name.to_string(),
        })
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get().and_then(|instance| instance.downcast_ref::<T>())
    }

    /// The shared handle, for identity comparisons.
    pub fn instance(&self) -> Option<&ModInstance> {
        self.cell.get()
    }

    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Exports a [`ModEntry`] type from a `cdylib` so the loader can find it.
///
/// ```rust,ignore
/// mod_api::export_mod!(GreeterMod);
/// ```
///
/// This generates `mod_declaration`, which hands the loader a heap
/// allocated [`ModDeclaration`]. The loader takes ownership of it.
#[macro_export]
macro_rules! export_mod {
    ($mod_type:ty) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn mod_declaration() -> *mut $crate::ModDeclaration {
            let declaration = $crate::ModDeclaration::of::<$mod_type>();
            Box::into_raw(Box::new(declaration))
        }
    };
}
