//! The authoritative in-memory world.
//!
//! Every collection (live entities, clients, ships, rooms, areas, templates, help, the
//! deferred-task queue) sits inside one [`WorldInner`] behind one `std::sync::Mutex`.
//! Each public operation takes the lock for its whole duration. The two exceptions are
//! documented on the methods themselves:
//!
//! * [`WorldStore::get_player`] drops the lock after scanning live players and reads the
//!   off-line record from disk without it.
//! * [`WorldStore::load`] reads every file before taking the lock; [`WorldStore::save`]
//!   holds it for the whole pass, so gameplay pauses while the world is written.
//!
//! `load` and `save` are not re-entrant and must be serialized by the caller.
//!
//! Queries hand out cloned snapshots. Mutation of a live entity goes through a
//! lock-guarded method ([`WorldStore::with_entity_mut`], [`WorldStore::apply_damage`], ...).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::metrics;
use crate::world::brain::brain_for;
use crate::world::clone::{clone_entity, clone_ship};
use crate::world::entity::{CharData, DamageOutcome, DamageRules, Entity, EntityId, PlayerProfile};
use crate::world::errors::WorldError;
use crate::world::gateway::WorldGateway;
use crate::world::reset::{reset_area, ResetReport};
use crate::world::scheduler::{DeferredAction, DeferredQueue, SchedulerStats};
use crate::world::session::{ClientId, ClientRef};
use crate::world::types::{
    AreaData, EntityState, HelpData, ItemData, Pool, RoomData, ShipData, ShipId, StarSystemData,
    Vnum, LAND,
};

/// Delay between an NPC's death and the removal of its corpse.
pub const DEFAULT_CORPSE_DECAY: Duration = Duration::from_secs(360);

/// Area bookkeeping. Rooms live in the flat room table; the area keeps their vnums in
/// definition order plus its own metadata and reset rules.
#[derive(Debug, Clone)]
pub(crate) struct AreaRecord {
    pub(crate) meta: AreaData,
    pub(crate) rooms: Vec<Vnum>,
}

/// Collection sizes, printed by `starmud status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldCounts {
    pub entities: usize,
    pub players: usize,
    pub clients: usize,
    pub areas: usize,
    pub rooms: usize,
    pub items: usize,
    pub mobs: usize,
    pub ship_prototypes: usize,
    pub ships: usize,
    pub helps: usize,
    pub starsystems: usize,
    pub deferred_tasks: usize,
}

/// Outcome of a save pass. Failed objects are named in `failed`; the rest were written.
#[derive(Debug, Clone, Default)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: Vec<String>,
    pub elapsed: Duration,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, what: String, result: Result<(), WorldError>) {
        match result {
            Ok(()) => self.saved += 1,
            Err(e) => {
                error!("failed to save {}: {}", what, e);
                self.failed.push(what);
            }
        }
    }
}

/// Everything guarded by the world lock.
#[derive(Debug, Default)]
pub(crate) struct WorldInner {
    pub(crate) entities: Vec<Entity>,
    pub(crate) clients: Vec<ClientRef>,
    pub(crate) ships: Vec<ShipData>,
    pub(crate) ship_prototypes: BTreeMap<Vnum, ShipData>,
    pub(crate) rooms: HashMap<Vnum, RoomData>,
    pub(crate) areas: BTreeMap<String, AreaRecord>,
    pub(crate) room_area: HashMap<Vnum, String>,
    pub(crate) items: BTreeMap<Vnum, ItemData>,
    pub(crate) mobs: BTreeMap<Vnum, CharData>,
    pub(crate) helps: Vec<HelpData>,
    pub(crate) starsystems: Vec<StarSystemData>,
    pub(crate) deferred: DeferredQueue,
    next_uid: u64,
}

impl WorldInner {
    /// Give the entity a runtime id if it has none and append it to the live list.
    ///
    /// An entity whose id is already live is refused; the existing id is returned.
    pub(crate) fn register(&mut self, mut entity: Entity) -> EntityId {
        if entity.uid().is_assigned() && self.position(entity.uid()).is_some() {
            error!(
                "add_entity: '{}' ({}) is already live; not adding it twice",
                entity.name(),
                entity.uid()
            );
            metrics::inc_reported_errors();
            return entity.uid();
        }
        if !entity.uid().is_assigned() {
            self.next_uid += 1;
            entity.char_data_mut().uid = EntityId(self.next_uid);
        } else if entity.uid().0 > self.next_uid {
            self.next_uid = entity.uid().0;
        }
        let id = entity.uid();
        self.entities.push(entity);
        id
    }

    pub(crate) fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.uid() == id)
    }

    pub(crate) fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.uid() == id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.uid() == id)
    }

    /// Hit points of whoever `entities[index]` is fighting, for the prompt's health bar.
    pub(crate) fn attacker_hp(&self, index: usize) -> Option<Pool> {
        let attacker = self.entities.get(index)?.attacker()?;
        self.entity(attacker).map(|a| a.char_data().hp)
    }

    fn remove_at(&mut self, index: usize) -> Entity {
        let entity = self.entities.remove(index);
        self.deferred.cancel_for(entity.uid());
        entity
    }

    pub(crate) fn insert_area(&mut self, mut area: AreaData) {
        if self.areas.contains_key(&area.name) {
            self.drop_area(&area.name);
        }
        let rooms = std::mem::take(&mut area.rooms);
        let mut vnums = Vec::with_capacity(rooms.len());
        for room in rooms {
            vnums.push(room.id);
            if let Some(previous) = self.room_area.insert(room.id, area.name.clone()) {
                if previous != area.name {
                    warn!(
                        "room {} moved from area '{}' to '{}'",
                        room.id, previous, area.name
                    );
                    if let Some(rec) = self.areas.get_mut(&previous) {
                        rec.rooms.retain(|v| *v != room.id);
                    }
                }
            }
            self.rooms.insert(room.id, room);
        }
        self.areas.insert(
            area.name.clone(),
            AreaRecord {
                meta: area,
                rooms: vnums,
            },
        );
    }

    fn drop_area(&mut self, name: &str) -> Option<AreaRecord> {
        let record = self.areas.remove(name)?;
        for vnum in &record.rooms {
            self.rooms.remove(vnum);
            self.room_area.remove(vnum);
        }
        Some(record)
    }

    /// Reassemble the on-disk form of an area from the flat room table.
    pub(crate) fn area_data(&self, name: &str) -> Option<AreaData> {
        let record = self.areas.get(name)?;
        let mut area = record.meta.clone();
        area.rooms = record
            .rooms
            .iter()
            .filter_map(|v| self.rooms.get(v).cloned())
            .collect();
        Some(area)
    }

    fn next_live_ship_id(&self) -> ShipId {
        smallest_free(self.ships.iter().map(|s| s.id))
    }

    fn remove_corpse(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.position(id)?;
        let is_corpse = matches!(
            &self.entities[index],
            Entity::Npc(ch) if ch.state == EntityState::Dead
        );
        if !is_corpse {
            debug!(
                "not removing {} ('{}'): not a dead NPC",
                id,
                self.entities[index].name()
            );
            return None;
        }
        let corpse = self.remove_at(index);
        debug!("corpse of '{}' ({}) decayed", corpse.name(), id);
        metrics::inc_corpses_removed();
        Some(corpse)
    }

    fn broadcast(&self, text: &str) {
        for client in &self.clients {
            client.send(text);
        }
    }

    fn counts(&self) -> WorldCounts {
        WorldCounts {
            entities: self.entities.len(),
            players: self.entities.iter().filter(|e| e.is_player()).count(),
            clients: self.clients.len(),
            areas: self.areas.len(),
            rooms: self.rooms.len(),
            items: self.items.len(),
            mobs: self.mobs.len(),
            ship_prototypes: self.ship_prototypes.len(),
            ships: self.ships.len(),
            helps: self.helps.len(),
            starsystems: self.starsystems.len(),
            deferred_tasks: self.deferred.len(),
        }
    }
}

/// Smallest positive integer not yielded by `taken`.
pub(crate) fn smallest_free<I: IntoIterator<Item = u32>>(taken: I) -> u32 {
    let mut used: Vec<u32> = taken.into_iter().filter(|v| *v > 0).collect();
    used.sort_unstable();
    used.dedup();
    let mut candidate = 1;
    for v in used {
        if v != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

/// Clone a template into a fresh live instance: state normal with no attacker, a brain
/// attached (the template's, or one built from its `brain` name) and the brain's spawn
/// hook run.
pub(crate) fn prepare_spawn(template: &Entity) -> Entity {
    let mut entity = clone_entity(template);
    let ch = entity.char_data_mut();
    ch.state = EntityState::Normal;
    ch.attacker = None;
    if ch.ai.is_none() {
        ch.ai = Some(brain_for(&ch.brain));
    }
    if let Some(brain) = ch.ai.clone() {
        if ch.brain.is_empty() {
            ch.brain = brain.name().to_string();
        }
        brain.on_spawn(ch);
    }
    metrics::inc_entities_spawned();
    entity
}

pub struct WorldStoreBuilder {
    gateway: Arc<dyn WorldGateway>,
    rules: DamageRules,
    corpse_decay: Duration,
}

impl WorldStoreBuilder {
    pub fn new(gateway: Arc<dyn WorldGateway>) -> Self {
        Self {
            gateway,
            rules: DamageRules::default(),
            corpse_decay: DEFAULT_CORPSE_DECAY,
        }
    }

    pub fn damage_rules(mut self, rules: DamageRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn corpse_decay(mut self, delay: Duration) -> Self {
        self.corpse_decay = delay;
        self
    }

    pub fn build(self) -> WorldStore {
        WorldStore {
            inner: Mutex::new(WorldInner::default()),
            gateway: self.gateway,
            rules: self.rules,
            corpse_decay: self.corpse_decay,
        }
    }
}

pub struct WorldStore {
    inner: Mutex<WorldInner>,
    gateway: Arc<dyn WorldGateway>,
    rules: DamageRules,
    corpse_decay: Duration,
}

impl WorldStore {
    pub fn new(gateway: Arc<dyn WorldGateway>) -> Self {
        WorldStoreBuilder::new(gateway).build()
    }

    pub fn rules(&self) -> DamageRules {
        self.rules
    }

    pub fn corpse_decay(&self) -> Duration {
        self.corpse_decay
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, WorldInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("world lock was poisoned by a panicking holder; recovering");
            poisoned.into_inner()
        })
    }

    // ---- live entities -------------------------------------------------------------

    pub fn add_entity(&self, entity: Entity) -> EntityId {
        self.lock().register(entity)
    }

    /// Remove a live entity. An id that is not live is logged as an error and leaves the
    /// collection untouched.
    pub fn remove_entity(&self, id: EntityId) -> Option<Entity> {
        let mut world = self.lock();
        match world.position(id) {
            Some(index) => Some(world.remove_at(index)),
            None => {
                error!("remove_entity: {} is not a live entity", id);
                metrics::inc_reported_errors();
                None
            }
        }
    }

    /// Clone `template` into the live world and return a snapshot of the new instance.
    pub fn spawn_entity(&self, template: &Entity) -> Entity {
        let mut entity = prepare_spawn(template);
        let id = self.lock().register(entity.clone());
        entity.char_data_mut().uid = id;
        debug!("spawned '{}' as {}", entity.name(), id);
        entity
    }

    /// Spawn mob template `vnum` into a land room.
    pub fn spawn_mob(&self, vnum: Vnum, room: Vnum) -> Option<Entity> {
        let template = self.lock().mobs.get(&vnum)?.clone();
        Some(self.spawn_entity(&Entity::Npc(template.in_room(room, LAND))))
    }

    pub fn get_entity(&self, id: EntityId) -> Option<Entity> {
        self.lock().entity(id).cloned()
    }

    pub fn get_entities_in_room(&self, room: Vnum, ship: ShipId) -> Vec<Entity> {
        self.lock()
            .entities
            .iter()
            .filter(|e| e.room_id() == room && e.ship_id() == ship)
            .cloned()
            .collect()
    }

    /// Every live entity, in insertion order.
    pub fn entities(&self) -> Vec<Entity> {
        self.lock().entities.clone()
    }

    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    /// Run `f` against one live entity while holding the lock.
    pub fn with_entity_mut<R>(&self, id: EntityId, f: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        let mut world = self.lock();
        world.entity_mut(id).map(f)
    }

    /// Apply damage to a live entity. An NPC that dies gets its corpse removal queued.
    pub fn apply_damage(&self, id: EntityId, damage: u32) -> Option<DamageOutcome> {
        let mut world = self.lock();
        let rules = self.rules;
        let entity = world.entity_mut(id)?;
        let outcome = entity.apply_damage(damage, &rules);
        let is_npc = !entity.is_player();
        let name = entity.name().to_string();
        if outcome == DamageOutcome::Killed {
            metrics::inc_deaths();
            if is_npc {
                world
                    .deferred
                    .schedule(self.corpse_decay, id, DeferredAction::RemoveCorpse);
                debug!(
                    "'{}' ({}) died; corpse decays in {:?}",
                    name, id, self.corpse_decay
                );
            } else {
                info!("player '{}' died", name);
            }
        }
        Some(outcome)
    }

    pub fn set_attacker(&self, id: EntityId, attacker: Option<EntityId>) -> bool {
        self.with_entity_mut(id, |e| e.set_attacker(attacker))
            .is_some()
    }

    pub fn send_to(&self, id: EntityId, text: &str) -> bool {
        self.with_entity_mut(id, |e| e.send(text)).is_some()
    }

    pub fn remove_corpse(&self, id: EntityId) -> Option<Entity> {
        self.lock().remove_corpse(id)
    }

    /// Execute every deferred task due at or before `now`. Returns how many ran.
    pub fn run_due_tasks(&self, now: Instant) -> usize {
        let mut world = self.lock();
        let due = world.deferred.take_due(now);
        let count = due.len();
        for task in due {
            match task.action {
                DeferredAction::RemoveCorpse => {
                    world.remove_corpse(task.entity);
                }
            }
        }
        count
    }

    pub fn is_scheduled(&self, id: EntityId, action: DeferredAction) -> bool {
        self.lock().deferred.is_scheduled(id, action)
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.lock().deferred.stats()
    }

    // ---- players and clients -------------------------------------------------------

    /// Live player by exact, case-sensitive name; otherwise the off-line record.
    ///
    /// The lock is released after the live scan so the file read happens without it.
    pub fn get_player(&self, name: &str) -> Option<PlayerProfile> {
        let world = self.lock();
        let live = world
            .entities
            .iter()
            .filter_map(Entity::as_player)
            .find(|p| p.ch.name == name)
            .cloned();
        drop(world);

        if live.is_some() {
            return live;
        }
        match self.gateway.read_player(name) {
            Ok(found) => found,
            Err(e) => {
                error!("could not read player record for '{}': {}", name, e);
                None
            }
        }
    }

    /// Live player by name, ignoring case.
    pub fn get_player_entity_by_name(&self, name: &str) -> Option<Entity> {
        let wanted = name.to_lowercase();
        self.lock()
            .entities
            .iter()
            .find(|e| e.is_player() && e.name().to_lowercase() == wanted)
            .cloned()
    }

    pub fn add_client(&self, client: ClientRef) {
        let mut world = self.lock();
        debug!("client {} connected", client.id());
        world.clients.push(client);
    }

    /// Drop a client, every live player bound to it, and hang up the connection.
    pub fn remove_client(&self, id: ClientId) -> bool {
        let mut world = self.lock();
        let Some(index) = world.clients.iter().position(|c| c.id() == id) else {
            error!("remove_client: client {} is not connected", id);
            metrics::inc_reported_errors();
            return false;
        };
        let bound: Vec<EntityId> = world
            .entities
            .iter()
            .filter_map(Entity::as_player)
            .filter(|p| p.client_id() == Some(id))
            .map(|p| p.ch.uid)
            .collect();
        for uid in bound {
            if let Some(pos) = world.position(uid) {
                let player = world.remove_at(pos);
                debug!("player '{}' left with client {}", player.name(), id);
            }
        }
        let client = world.clients.remove(index);
        drop(world);
        client.disconnect();
        true
    }

    pub fn get_entity_for_client(&self, id: ClientId) -> Option<Entity> {
        self.lock()
            .entities
            .iter()
            .find(|e| e.as_player().and_then(PlayerProfile::client_id) == Some(id))
            .cloned()
    }

    /// Echo to every connected client.
    pub fn broadcast(&self, text: &str) {
        self.lock().broadcast(text);
    }

    // ---- ships ---------------------------------------------------------------------

    /// Register a live ship. A ship without an id gets the smallest free one.
    pub fn add_ship(&self, mut ship: ShipData) -> ShipId {
        let mut world = self.lock();
        if ship.id == 0 {
            ship.id = world.next_live_ship_id();
        }
        let id = ship.id;
        world.ships.push(ship);
        id
    }

    pub fn remove_ship(&self, id: ShipId) -> Option<ShipData> {
        let mut world = self.lock();
        match world.ships.iter().position(|s| s.id == id) {
            Some(index) => Some(world.ships.remove(index)),
            None => {
                error!("remove_ship: ship {} is not a live ship", id);
                metrics::inc_reported_errors();
                None
            }
        }
    }

    pub fn remove_ship_prototype(&self, vnum: Vnum) -> Option<ShipData> {
        let removed = self.lock().ship_prototypes.remove(&vnum);
        if removed.is_none() {
            error!("remove_ship_prototype: no prototype with vnum {}", vnum);
            metrics::inc_reported_errors();
        }
        removed
    }

    pub fn spawn_ship(&self, prototype: &ShipData) -> ShipData {
        let mut ship = clone_ship(prototype);
        let mut world = self.lock();
        ship.id = world.next_live_ship_id();
        world.ships.push(ship.clone());
        debug!("spawned ship '{}' ({}) from prototype {}", ship.name, ship.id, ship.oid);
        ship
    }

    pub fn add_ship_prototype(&self, ship: ShipData) {
        self.lock().ship_prototypes.insert(ship.id, ship);
    }

    pub fn get_ship_prototype(&self, vnum: Vnum) -> Option<ShipData> {
        self.lock().ship_prototypes.get(&vnum).cloned()
    }

    pub fn get_ship(&self, id: ShipId) -> Option<ShipData> {
        self.lock().ships.iter().find(|s| s.id == id).cloned()
    }

    /// Ships landed at `room`.
    pub fn get_ships_in_room(&self, room: Vnum) -> Vec<ShipData> {
        self.lock()
            .ships
            .iter()
            .filter(|s| !s.in_space && s.location_id == room)
            .cloned()
            .collect()
    }

    /// Ships in open space in the named system.
    pub fn get_ships_in_system(&self, system: &str) -> Vec<ShipData> {
        self.lock()
            .ships
            .iter()
            .filter(|s| s.in_space && s.current_system == system)
            .cloned()
            .collect()
    }

    pub fn ship_name_available(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        !self
            .lock()
            .ships
            .iter()
            .any(|s| s.name.to_lowercase() == wanted)
    }

    // ---- rooms and areas -----------------------------------------------------------

    /// Room by vnum: inside ship `ship`, or among land rooms when `ship` is [`LAND`].
    pub fn get_room(&self, room: Vnum, ship: ShipId) -> Option<RoomData> {
        let world = self.lock();
        if ship == LAND {
            return world.rooms.get(&room).cloned();
        }
        world
            .ships
            .iter()
            .find(|s| s.id == ship)?
            .rooms
            .iter()
            .find(|r| r.id == room)
            .cloned()
    }

    /// Name of the area a land room belongs to.
    pub fn area_of_room(&self, room: Vnum) -> Option<String> {
        self.lock().room_area.get(&room).cloned()
    }

    pub fn add_area(&self, area: AreaData) {
        self.lock().insert_area(area);
    }

    pub fn get_area(&self, name: &str) -> Option<AreaData> {
        self.lock().area_data(name)
    }

    /// Insert or replace a land room and index it under `area`. Unknown areas are left
    /// alone and `false` is returned.
    pub fn set_room(&self, room: RoomData, area: &str) -> bool {
        let mut world = self.lock();
        if !world.areas.contains_key(area) {
            debug!("set_room: no area named '{}'", area);
            return false;
        }
        let vnum = room.id;
        if let Some(previous) = world.room_area.insert(vnum, area.to_string()) {
            if previous != area {
                if let Some(rec) = world.areas.get_mut(&previous) {
                    rec.rooms.retain(|v| *v != vnum);
                }
            }
        }
        if let Some(rec) = world.areas.get_mut(area) {
            if !rec.rooms.contains(&vnum) {
                rec.rooms.push(vnum);
            }
        }
        world.rooms.insert(vnum, room);
        true
    }

    /// Drop an area together with all its rooms.
    pub fn remove_area(&self, name: &str) -> bool {
        let removed = self.lock().drop_area(name);
        match removed {
            Some(record) => {
                info!("removed area '{}' ({} rooms)", name, record.rooms.len());
                true
            }
            None => false,
        }
    }

    /// Next room vnum for the area containing land room `room`, or for ship `ship`.
    ///
    /// A placeholder room named "A void" is handed out first. Otherwise one past the
    /// highest vnum in the area or ship. Returns 0 when the room or ship is unknown.
    pub fn get_next_room_vnum(&self, room: Vnum, ship: ShipId) -> Vnum {
        let world = self.lock();
        if ship != LAND {
            let Some(s) = world.ships.iter().find(|s| s.id == ship) else {
                return 0;
            };
            if let Some(void) = s.rooms.iter().find(|r| r.is_void()) {
                return void.id;
            }
            return s.rooms.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        }

        let Some(record) = world
            .room_area
            .get(&room)
            .and_then(|name| world.areas.get(name))
        else {
            return 0;
        };
        if let Some(void) = record
            .rooms
            .iter()
            .find(|v| world.rooms.get(*v).map(RoomData::is_void).unwrap_or(false))
        {
            return *void;
        }
        let mut next = record.rooms.iter().copied().max().unwrap_or(0) + 1;
        while world.rooms.contains_key(&next) {
            next += 1;
        }
        next
    }

    pub fn get_next_item_vnum(&self) -> Vnum {
        smallest_free(self.lock().items.keys().copied())
    }

    pub fn get_next_mob_vnum(&self) -> Vnum {
        smallest_free(self.lock().mobs.keys().copied())
    }

    pub fn get_next_ship_vnum(&self) -> Vnum {
        smallest_free(self.lock().ship_prototypes.keys().copied())
    }

    // ---- templates and reference data ----------------------------------------------

    pub fn add_item_template(&self, item: ItemData) {
        self.lock().items.insert(item.id, item);
    }

    pub fn add_mob_template(&self, mob: CharData) {
        self.lock().mobs.insert(mob.id, mob);
    }

    pub fn get_item(&self, vnum: Vnum) -> Option<ItemData> {
        self.lock().items.get(&vnum).cloned()
    }

    pub fn get_mob(&self, vnum: Vnum) -> Option<CharData> {
        self.lock().mobs.get(&vnum).cloned()
    }

    /// Help entries with a keyword starting with `prefix` (case-insensitive).
    pub fn get_help(&self, prefix: &str) -> Vec<HelpData> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.lock()
            .helps
            .iter()
            .filter(|h| {
                h.keywords
                    .iter()
                    .any(|k| k.to_lowercase().starts_with(&prefix))
            })
            .cloned()
            .collect()
    }

    pub fn add_help(&self, help: HelpData) {
        self.lock().helps.push(help);
    }

    pub fn get_starsystem(&self, name: &str) -> Option<StarSystemData> {
        self.lock()
            .starsystems
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn starsystems(&self) -> Vec<StarSystemData> {
        self.lock().starsystems.clone()
    }

    pub fn counts(&self) -> WorldCounts {
        self.lock().counts()
    }

    // ---- resets, load and save -----------------------------------------------------

    /// Re-apply every area's reset rules.
    pub fn reset_all(&self) -> ResetReport {
        let mut world = self.lock();
        let names: Vec<String> = world.areas.keys().cloned().collect();
        let mut total = ResetReport::default();
        for name in names {
            let report = reset_area(&mut world, &name);
            if report.changed() {
                debug!(
                    "area '{}' reset: {} mobs spawned, {} items placed",
                    name, report.mobs_spawned, report.items_placed
                );
            }
            total.absorb(&report);
        }
        info!(
            "world reset: {} mobs spawned, {} items placed",
            total.mobs_spawned, total.items_placed
        );
        total
    }

    /// Read every template collection and insert it.
    ///
    /// All file reads happen before the lock is taken. Any read or parse failure aborts
    /// the load and is returned to the caller.
    pub fn load(&self) -> Result<WorldCounts, WorldError> {
        info!("loading world");
        let helps = self.gateway.load_helps()?;
        info!("{} help files loaded", helps.len());
        let areas = self.gateway.load_areas()?;
        info!("{} areas loaded", areas.len());
        let items = self.gateway.load_items()?;
        info!("{} items loaded", items.len());
        let starsystems = self.gateway.load_starsystems()?;
        info!("{} star systems loaded", starsystems.len());
        let mobs = self.gateway.load_mobs()?;
        info!("{} mobs loaded", mobs.len());
        let ships = self.gateway.load_ships()?;
        info!(
            "{} ships loaded, {} prototypes",
            ships.live.len(),
            ships.prototypes.len()
        );

        let mut world = self.lock();
        world.helps.extend(helps);
        for area in areas {
            world.insert_area(area);
        }
        for item in items {
            world.items.insert(item.id, item);
        }
        world.starsystems.extend(starsystems);
        for mob in mobs {
            world.mobs.insert(mob.id, mob);
        }
        for proto in ships.prototypes {
            world.ship_prototypes.insert(proto.id, proto);
        }
        for mut ship in ships.live {
            if ship.id == 0 {
                ship.id = world.next_live_ship_id();
            }
            world.ships.push(ship);
        }
        Ok(world.counts())
    }

    /// Write areas, mobs, items, ships and live players, in that order.
    ///
    /// Holds the lock for the whole pass. A failed write is logged and listed in the
    /// report; the pass carries on with the next object.
    pub fn save(&self) -> SaveReport {
        let world = self.lock();
        let started = Instant::now();
        world.broadcast("\r\nSaving game world...\r\n");
        let mut report = SaveReport::default();

        for name in world.areas.keys() {
            if let Some(area) = world.area_data(name) {
                report.record(format!("area '{}'", name), self.gateway.save_area(&area));
            }
        }
        for mob in world.mobs.values() {
            report.record(format!("mob {}", mob.id), self.gateway.save_mob(mob));
        }
        for item in world.items.values() {
            report.record(format!("item {}", item.id), self.gateway.save_item(item));
        }
        for proto in world.ship_prototypes.values() {
            report.record(
                format!("ship prototype {}", proto.id),
                self.gateway.save_ship_prototype(proto),
            );
        }
        for ship in &world.ships {
            report.record(format!("ship '{}'", ship.name), self.gateway.save_ship(ship));
        }
        for player in world.entities.iter().filter_map(Entity::as_player) {
            report.record(
                format!("player '{}'", player.ch.name),
                self.gateway.save_player(player),
            );
        }

        report.elapsed = started.elapsed();
        world.broadcast(&format!("\r\nSave took {:?}\r\n", report.elapsed));
        drop(world);

        metrics::record_save(report.failed.len());
        info!(
            "world saved: {} objects in {:?}, {} failures",
            report.saved,
            report.elapsed,
            report.failed.len()
        );
        report
    }
}
