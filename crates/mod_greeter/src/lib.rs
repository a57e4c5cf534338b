use mod_api::{
    export_mod, ConstructError, EventBus, EventError, InjectError, InstanceRequest, InstanceSlot,
    Mod, ModDescriptor, ModEntry, ModInitEvent, ModInstance, ModPostInitEvent, ModPreInitEvent,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Greeter Mod
// ============================================================================

pub const GREETER_ID: &str = "greeter";

/// Event published under `mod:greeter:greeting` during init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingEvent {
    pub message: String,
    pub host_version: String,
    pub mod_count: usize,
}

/// A sample mod that says hello at every lifecycle stage.
pub struct GreeterMod {
    me: InstanceSlot<GreeterMod>,
    greetings: AtomicU32,
}

impl GreeterMod {
    pub fn new() -> Self {
        println!("🎉 GreeterMod: Creating new instance");
        Self {
            me: InstanceSlot::new("me"),
            greetings: AtomicU32::new(0),
        }
    }

    /// Greetings published so far.
    pub fn greetings(&self) -> u32 {
        self.greetings.load(Ordering::Relaxed)
    }
}

impl Default for GreeterMod {
    fn default() -> Self {
        Self::new()
    }
}

impl Mod for GreeterMod {
    fn inject(&self, slot: &str, instance: ModInstance) -> Result<(), InjectError> {
        match slot {
            "me" => self.me.set(instance),
            _ => Err(InjectError::UnknownSlot {
                slot: slot.to_string(),
            }),
        }
    }

    fn pre_init(&self, event: &ModPreInitEvent, _events: &EventBus) -> Result<(), EventError> {
        // The loader resolves instance requests before pre-init.
        if !self.me.is_set() {
            return Err(EventError::handler("greeter was not given its own instance"));
        }
        println!(
            "👋 GreeterMod: Pre-init on host {} alongside {} mod(s)",
            event.host_version, event.mod_count
        );
        Ok(())
    }

    fn init(&self, event: &ModInitEvent, events: &EventBus) -> Result<(), EventError> {
        let greeting = GreetingEvent {
            message: format!("Hello from {}!", GREETER_ID),
            host_version: event.host_version.to_string(),
            mod_count: event.mod_count,
        };
        events.emit_mod(GREETER_ID, "greeting", &greeting)?;
        self.greetings.fetch_add(1, Ordering::Relaxed);
        println!("👋 GreeterMod: ✅ Greeting published");
        Ok(())
    }

    fn post_init(&self, _event: &ModPostInitEvent, _events: &EventBus) -> Result<(), EventError> {
        println!("👋 GreeterMod: Ready, {} greeting(s) sent", self.greetings());
        Ok(())
    }
}

impl ModEntry for GreeterMod {
    fn descriptor() -> ModDescriptor {
        ModDescriptor::new(GREETER_ID, [1, 0, 0])
            .with_name("Greeter")
            .with_resource_location("assets/greeter")
            .supports([0, 3, 0])
    }

    fn wants() -> Vec<InstanceRequest> {
        vec![InstanceRequest::own("me")]
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self::new())
    }
}

export_mod!(GreeterMod);

#[cfg(test)]
mod tests {
    use super::*;
    use mod_api::Version;
    use std::sync::{Arc, Mutex};

    #[test]
    fn declaration_describes_greeter() {
        let declaration = unsafe { Box::from_raw(mod_declaration()) };
        let descriptor = (declaration.descriptor)();
        assert_eq!(descriptor.id, GREETER_ID);
        assert!(descriptor.supports_host(&Version::from([0, 3, 0])));
        assert_eq!((declaration.wants)(), vec![InstanceRequest::own("me")]);
        assert!((declaration.construct)().is_ok());
    }

    #[test]
    fn pre_init_requires_self_instance() {
        let greeter: ModInstance = Arc::new(GreeterMod::new());
        let events = EventBus::new();
        let event = ModPreInitEvent {
            host_version: Version::from([0, 3, 0]),
            mod_count: 1,
        };

        assert!(greeter.pre_init(&event, &events).is_err());
        greeter.inject("me", greeter.clone()).unwrap();
        assert!(greeter.pre_init(&event, &events).is_ok());
        assert!(matches!(
            greeter.inject("friend", greeter.clone()),
            Err(InjectError::UnknownSlot { .. })
        ));
    }

    #[test]
    fn init_publishes_greeting() {
        let greeter = GreeterMod::new();
        let events = EventBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        events
            .on_mod(GREETER_ID, "greeting", move |event: GreetingEvent| {
                sink.lock().unwrap().push(event);
                Ok(())
            })
            .unwrap();

        let event = ModInitEvent {
            host_version: Version::from([0, 3, 0]),
            mod_count: 2,
        };
        greeter.init(&event, &events).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].host_version, "0.3.0");
        assert_eq!(received[0].mod_count, 2);
        assert_eq!(greeter.greetings(), 1);
    }
}
