//! The simulation heartbeat.
//!
//! [`TickProcessor::process_entities`] is one pass over every live entity under the world
//! lock, in insertion order. [`spawn_tick_loop`] drives it from a tokio interval and also
//! runs deferred tasks, periodic area resets and autosaves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics;
use crate::world::dice::Dice;
use crate::world::store::{WorldInner, WorldStore};
use crate::world::types::EntityState;

/// Skill consulted for natural hit point recovery.
pub const HEALING_SKILL: &str = "healing";

const SEDATED_MESSAGE: &str = "\r\nYou feel extremely relaxed.\r\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub entities: usize,
    pub heal_increments: usize,
    pub regen_events: usize,
}

pub struct TickProcessor {
    rng: StdRng,
}

impl TickProcessor {
    /// A fixed seed makes every roll reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn d10(&mut self) -> i32 {
        Dice::D10.roll(&mut self.rng)
    }

    pub fn process_entities(&mut self, store: &WorldStore) -> TickReport {
        let started = Instant::now();
        let mut world = store.lock();
        let mut report = TickReport {
            entities: world.entities.len(),
            ..TickReport::default()
        };

        for i in 0..world.entities.len() {
            let state = world.entities[i].state();
            let healing = world.entities[i].char_data().skill_value(HEALING_SKILL);
            match state {
                EntityState::Normal => {
                    if self.d10() >= 10 - healing {
                        heal(&mut world, i, &mut report);
                    }
                }
                EntityState::Sitting => {
                    if self.d10() >= 8 - healing {
                        heal(&mut world, i, &mut report);
                        heal(&mut world, i, &mut report);
                    }
                }
                EntityState::Sleeping | EntityState::Unconscious => {
                    heal(&mut world, i, &mut report);
                }
                EntityState::Sedated => {
                    world.entities[i].char_data_mut().mv.drain(1);
                    if self.d10() == 10 {
                        let attacker_hp = world.attacker_hp(i);
                        let entity = &mut world.entities[i];
                        entity.send(SEDATED_MESSAGE);
                        entity.prompt(attacker_hp);
                    }
                }
                _ => {}
            }

            if self.d10() == 10 {
                let ch = world.entities[i].char_data_mut();
                ch.mp.gain(1);
                ch.mv.gain(1);
                report.regen_events += 1;
            }
        }
        drop(world);

        metrics::observe_tick(started);
        trace!(
            "tick: {} entities, {} heal increments, {} regen events",
            report.entities,
            report.heal_increments,
            report.regen_events
        );
        report
    }
}

/// One hit point back, clamped to max, then refresh the prompt.
fn heal(world: &mut WorldInner, index: usize, report: &mut TickReport) {
    let attacker_hp = world.attacker_hp(index);
    let entity = &mut world.entities[index];
    entity.heal_one();
    entity.prompt(attacker_hp);
    report.heal_increments += 1;
    metrics::inc_heal_increments();
}

#[derive(Debug, Clone)]
pub struct TickSettings {
    pub interval: Duration,
    /// `None` disables periodic resets.
    pub reset_interval: Option<Duration>,
    /// `None` disables autosave.
    pub autosave_interval: Option<Duration>,
    pub rng_seed: Option<u64>,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            reset_interval: Some(Duration::from_secs(300)),
            autosave_interval: Some(Duration::from_secs(900)),
            rng_seed: None,
        }
    }
}

/// Handle to a running tick loop.
pub struct TickHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<u64>,
}

impl TickHandle {
    /// Stop the loop after the current tick and return how many ticks it ran.
    pub async fn shutdown(mut self) -> u64 {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.join.await {
            Ok(ticks) => ticks,
            Err(e) => {
                error!("tick loop task failed: {}", e);
                0
            }
        }
    }
}

/// Run ticks on `store` until the returned handle is shut down.
pub fn spawn_tick_loop(store: Arc<WorldStore>, settings: TickSettings) -> TickHandle {
    let (tx, mut rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        let mut processor = TickProcessor::new(settings.rng_seed);
        let mut interval = tokio::time::interval(settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_reset = Instant::now();
        let mut last_save = Instant::now();
        let mut ticks: u64 = 0;
        info!("tick loop started ({:?} interval)", settings.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    processor.process_entities(&store);
                    let ran = store.run_due_tasks(Instant::now());
                    if ran > 0 {
                        debug!("{} deferred tasks executed", ran);
                    }
                    ticks += 1;

                    if let Some(every) = settings.reset_interval {
                        if last_reset.elapsed() >= every {
                            store.reset_all();
                            last_reset = Instant::now();
                        }
                    }

                    if let Some(every) = settings.autosave_interval {
                        if last_save.elapsed() >= every {
                            let saver = Arc::clone(&store);
                            match tokio::task::spawn_blocking(move || saver.save()).await {
                                Ok(report) if !report.is_clean() => {
                                    warn!("autosave finished with {} failures", report.failed.len());
                                }
                                Ok(_) => {}
                                Err(e) => error!("autosave task failed: {}", e),
                            }
                            last_save = Instant::now();
                        }
                    }
                }
                _ = &mut rx => {
                    info!("tick loop stopping after {} ticks", ticks);
                    break;
                }
            }
        }
        ticks
    });

    TickHandle {
        shutdown: Some(tx),
        join,
    }
}
