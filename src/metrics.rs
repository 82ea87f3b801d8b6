//! Process-wide simulation counters.
//! Cheap enough to bump from inside the world lock; read by the `status` command and logs.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

static TICKS: AtomicU64 = AtomicU64::new(0);
static TICK_TIME_SUM_US: AtomicU64 = AtomicU64::new(0);
static HEAL_INCREMENTS: AtomicU64 = AtomicU64::new(0);
static DEATHS: AtomicU64 = AtomicU64::new(0);
static CORPSES_REMOVED: AtomicU64 = AtomicU64::new(0);
static ENTITIES_SPAWNED: AtomicU64 = AtomicU64::new(0);
static REPORTED_ERRORS: AtomicU64 = AtomicU64::new(0);
static SAVES: AtomicU64 = AtomicU64::new(0);
static SAVE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn observe_tick(started: Instant) {
    let us = started.elapsed().as_micros() as u64;
    TICKS.fetch_add(1, Ordering::Relaxed);
    TICK_TIME_SUM_US.fetch_add(us, Ordering::Relaxed);
}

pub fn inc_heal_increments() {
    HEAL_INCREMENTS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deaths() {
    DEATHS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_corpses_removed() {
    CORPSES_REMOVED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_entities_spawned() {
    ENTITIES_SPAWNED.fetch_add(1, Ordering::Relaxed);
}

/// A non-fatal store error was logged (e.g. removing an entity that is not live).
pub fn inc_reported_errors() {
    REPORTED_ERRORS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_save(failures: usize) {
    SAVES.fetch_add(1, Ordering::Relaxed);
    SAVE_FAILURES.fetch_add(failures as u64, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Snapshot {
    pub ticks: u64,
    pub tick_avg_us: Option<u64>,
    pub heal_increments: u64,
    pub deaths: u64,
    pub corpses_removed: u64,
    pub entities_spawned: u64,
    pub reported_errors: u64,
    pub saves: u64,
    pub save_failures: u64,
}

pub fn snapshot() -> Snapshot {
    let ticks = TICKS.load(Ordering::Relaxed);
    let sum = TICK_TIME_SUM_US.load(Ordering::Relaxed);
    Snapshot {
        ticks,
        tick_avg_us: if ticks > 0 { Some(sum / ticks) } else { None },
        heal_increments: HEAL_INCREMENTS.load(Ordering::Relaxed),
        deaths: DEATHS.load(Ordering::Relaxed),
        corpses_removed: CORPSES_REMOVED.load(Ordering::Relaxed),
        entities_spawned: ENTITIES_SPAWNED.load(Ordering::Relaxed),
        reported_errors: REPORTED_ERRORS.load(Ordering::Relaxed),
        saves: SAVES.load(Ordering::Relaxed),
        save_failures: SAVE_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests bump them concurrently, so only
    // monotonic growth is asserted.
    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        inc_deaths();
        inc_reported_errors();
        observe_tick(Instant::now());
        record_save(2);
        let after = snapshot();
        assert!(after.deaths > before.deaths);
        assert!(after.reported_errors > before.reported_errors);
        assert!(after.ticks > before.ticks);
        assert!(after.tick_avg_us.is_some());
        assert!(after.save_failures >= before.save_failures + 2);
    }
}
