//! Area repopulation.
//!
//! Each area lists mob resets (keep up to `max` living copies of a mob in a room) and
//! item resets (keep one copy of an item on a room's floor). Resets run with the world
//! lock held by the caller.

use log::warn;

use crate::world::clone::clone_item;
use crate::world::entity::Entity;
use crate::world::store::{prepare_spawn, WorldInner};
use crate::world::types::{EntityState, LAND};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub mobs_spawned: usize,
    pub items_placed: usize,
}

impl ResetReport {
    pub fn changed(&self) -> bool {
        self.mobs_spawned > 0 || self.items_placed > 0
    }

    pub fn absorb(&mut self, other: &ResetReport) {
        self.mobs_spawned += other.mobs_spawned;
        self.items_placed += other.items_placed;
    }
}

pub(crate) fn reset_area(world: &mut WorldInner, name: &str) -> ResetReport {
    let mut report = ResetReport::default();
    let Some(record) = world.areas.get(name) else {
        return report;
    };
    let mob_resets = record.meta.mobs.clone();
    let item_resets = record.meta.items.clone();

    for reset in mob_resets {
        let Some(template) = world.mobs.get(&reset.mob) else {
            warn!(
                "area '{}': mob reset names unknown mob {}",
                name, reset.mob
            );
            continue;
        };
        let template = Entity::Npc(template.clone().in_room(reset.room, LAND));
        let present = world
            .entities
            .iter()
            .filter(|e| {
                !e.is_player()
                    && e.char_data().id == reset.mob
                    && e.room_id() == reset.room
                    && e.ship_id() == LAND
                    && e.state() != EntityState::Dead
            })
            .count();
        for _ in present..reset.max {
            world.register(prepare_spawn(&template));
            report.mobs_spawned += 1;
        }
    }

    for reset in item_resets {
        let Some(template) = world.items.get(&reset.item) else {
            warn!(
                "area '{}': item reset names unknown item {}",
                name, reset.item
            );
            continue;
        };
        let item = clone_item(template);
        let Some(room) = world.rooms.get_mut(&reset.room) else {
            warn!(
                "area '{}': item reset targets unknown room {}",
                name, reset.room
            );
            continue;
        };
        if !room.items.iter().any(|i| i.id == reset.item) {
            room.items.push(item);
            report.items_placed += 1;
        }
    }

    report
}
