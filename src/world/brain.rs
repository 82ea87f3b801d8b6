//! Pluggable behaviour drivers for non-player characters.
//!
//! The store only ever calls the spawn hook; everything else a brain does is opaque to
//! the world core. Brains are shared by reference between a template and its clones.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;

use crate::world::entity::CharData;

/// Name used when a template does not ask for a specific brain.
pub const GENERIC_BRAIN: &str = "generic";

pub trait Brain: fmt::Debug + Send + Sync {
    /// Identifier written back to the `brain` field of saved templates.
    fn name(&self) -> &str;

    /// Invoked once each time a character driven by this brain is spawned.
    fn on_spawn(&self, ch: &mut CharData);
}

/// Shared handle to a brain.
pub type BrainRef = Arc<dyn Brain>;

/// Default driver: wanders nowhere and remembers how many bodies it has animated.
#[derive(Debug, Default)]
pub struct GenericBrain {
    spawned: AtomicU64,
}

impl GenericBrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_count(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Brain for GenericBrain {
    fn name(&self) -> &str {
        GENERIC_BRAIN
    }

    fn on_spawn(&self, ch: &mut CharData) {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("brain {} animating '{}' (spawn #{})", GENERIC_BRAIN, ch.name, n);
    }
}

/// Build the brain a template names. Unknown names fall back to the generic driver.
pub fn brain_for(name: &str) -> BrainRef {
    match name.trim().to_ascii_lowercase().as_str() {
        "" | GENERIC_BRAIN => Arc::new(GenericBrain::new()),
        other => {
            debug!("no brain registered as '{}', using {}", other, GENERIC_BRAIN);
            Arc::new(GenericBrain::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_brain_counts_spawns() {
        let brain = GenericBrain::new();
        let mut ch = CharData::new(1, "a protocol droid");
        brain.on_spawn(&mut ch);
        brain.on_spawn(&mut ch);
        assert_eq!(brain.spawn_count(), 2);
    }

    #[test]
    fn unknown_brain_names_fall_back() {
        assert_eq!(brain_for("sentry").name(), GENERIC_BRAIN);
        assert_eq!(brain_for("").name(), GENERIC_BRAIN);
    }
}
