//! Delayed world actions.
//!
//! The queue is owned by the store and only touched under the store lock. Nothing here
//! runs on its own: the tick loop calls [`crate::world::store::WorldStore::run_due_tasks`]
//! which drains whatever has come due and executes it against the locked world.
//!
//! Kept as a sorted `Vec`; queue sizes are a handful of corpses at a time.

use std::time::{Duration, Instant};

use crate::world::entity::EntityId;

/// Longest delay a task can be queued for.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeferredAction {
    /// Remove a dead NPC after its decay delay.
    RemoveCorpse,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeferredTask {
    pub due: Instant,
    pub entity: EntityId,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    pub queued: usize,
    pub scheduled_total: u64,
    pub executed_total: u64,
    pub cancelled_total: u64,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: Vec<DeferredTask>,
    scheduled_total: u64,
    executed_total: u64,
    cancelled_total: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` after `delay`. Delays past [`MAX_DELAY`] are clamped to it.
    pub fn schedule(&mut self, delay: Duration, entity: EntityId, action: DeferredAction) {
        let now = Instant::now();
        let due = now
            .checked_add(delay.min(MAX_DELAY))
            .unwrap_or(now);
        self.schedule_at(due, entity, action);
    }

    pub fn schedule_at(&mut self, due: Instant, entity: EntityId, action: DeferredAction) {
        // Stable position after every task due at or before `due`.
        let pos = self.tasks.partition_point(|t| t.due <= due);
        self.tasks.insert(
            pos,
            DeferredTask {
                due,
                entity,
                action,
            },
        );
        self.scheduled_total += 1;
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let split = self.tasks.partition_point(|t| t.due <= now);
        let due: Vec<DeferredTask> = self.tasks.drain(..split).collect();
        self.executed_total += due.len() as u64;
        due
    }

    /// Drop pending tasks for an entity that left the world some other way.
    pub fn cancel_for(&mut self, entity: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.entity != entity);
        let cancelled = before - self.tasks.len();
        self.cancelled_total += cancelled as u64;
        cancelled
    }

    pub fn is_scheduled(&self, entity: EntityId, action: DeferredAction) -> bool {
        self.tasks
            .iter()
            .any(|t| t.entity == entity && t.action == action)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.first().map(|t| t.due)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            queued: self.tasks.len(),
            scheduled_total: self.scheduled_total,
            executed_total: self.executed_total,
            cancelled_total: self.cancelled_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_come_out_in_time_order() {
        let base = Instant::now();
        let mut q = DeferredQueue::new();
        q.schedule_at(base + Duration::from_secs(30), EntityId(3), DeferredAction::RemoveCorpse);
        q.schedule_at(base + Duration::from_secs(10), EntityId(1), DeferredAction::RemoveCorpse);
        q.schedule_at(base + Duration::from_secs(20), EntityId(2), DeferredAction::RemoveCorpse);

        assert!(q.take_due(base).is_empty());
        let due = q.take_due(base + Duration::from_secs(20));
        let ids: Vec<u64> = due.iter().map(|t| t.entity.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_due(), Some(base + Duration::from_secs(30)));
    }

    #[test]
    fn cancel_drops_only_that_entity() {
        let mut q = DeferredQueue::new();
        q.schedule(Duration::from_secs(360), EntityId(5), DeferredAction::RemoveCorpse);
        q.schedule(Duration::from_secs(360), EntityId(6), DeferredAction::RemoveCorpse);
        assert_eq!(q.cancel_for(EntityId(5)), 1);
        assert!(!q.is_scheduled(EntityId(5), DeferredAction::RemoveCorpse));
        assert!(q.is_scheduled(EntityId(6), DeferredAction::RemoveCorpse));
        let stats = q.stats();
        assert_eq!(stats.scheduled_total, 2);
        assert_eq!(stats.cancelled_total, 1);
    }

    #[test]
    fn huge_delay_is_clamped_instead_of_overflowing() {
        let mut q = DeferredQueue::new();
        let before = Instant::now();
        q.schedule(Duration::from_secs(u64::MAX), EntityId(7), DeferredAction::RemoveCorpse);
        assert!(q.is_scheduled(EntityId(7), DeferredAction::RemoveCorpse));
        let due = q.next_due().unwrap();
        assert!(due <= Instant::now() + MAX_DELAY);
        assert!(due >= before + MAX_DELAY);
        assert!(q.take_due(Instant::now()).is_empty());
    }
}
