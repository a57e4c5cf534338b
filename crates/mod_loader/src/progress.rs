//! Best-effort progress notifications for a loading screen.

use serde::Serialize;
use tokio::sync::broadcast;

/// Stage labels, in the order a load emits them.
pub mod stage {
    pub const FINDING_MODS: &str = "Finding mods";
    pub const CONSTRUCTING_MODS: &str = "Constructing mods";
    pub const DISPATCHING_INSTANCES: &str = "Dispatching instances";
    pub const REGISTERING_INITIALIZER: &str = "Registering initializer";
    pub const PRE_INITIALIZING_MODS: &str = "Pre-initializing mods";
    pub const INITIALIZING_MODS: &str = "Initializing mods";
    pub const POST_INITIALIZING_MODS: &str = "Post-initializing mods";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadingEvent {
    /// A new stage started; `has_steps` tells whether [`LoadingEvent::Step`]s follow.
    Stage { label: String, has_steps: bool },
    /// One unit of work inside the current stage. `current` counts from 1.
    Step {
        label: String,
        current: usize,
        total: usize,
    },
}

/// Creates a progress channel for [`crate::ModLoader::with_progress`].
pub fn channel(
    capacity: usize,
) -> (broadcast::Sender<LoadingEvent>, broadcast::Receiver<LoadingEvent>) {
    broadcast::channel(capacity)
}

/// Sends [`LoadingEvent`]s if anyone listens, and drops them otherwise.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<broadcast::Sender<LoadingEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: broadcast::Sender<LoadingEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn stage(&self, label: &str, has_steps: bool) {
        self.send(LoadingEvent::Stage {
            label: label.to_string(),
            has_steps,
        });
    }

    pub fn step(&self, label: &str, current: usize, total: usize) {
        self.send(LoadingEvent::Step {
            label: label.to_string(),
            current,
            total,
        });
    }

    fn send(&self, event: LoadingEvent) {
        if let Some(sender) = &self.sender {
            // No receivers is fine.
            let _ = sender.send(event);
        }
    }
}
