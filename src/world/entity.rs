//! Characters: the template/NPC shape, the live player wrapper, and the sum type the
//! store holds.
//!
//! Both variants expose the same capability set (identification, location, vitals,
//! combat target, notification) through [`Entity`], so the store and the tick processor
//! never need to ask which variant they hold except where behaviour really differs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Weak;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::brain::BrainRef;
use crate::world::dice::roll_dice;
use crate::world::session::{Client, ClientId};
use crate::world::types::{EntityState, ItemData, Pool, ShipId, Stat, Vnum, WearLoc, LAND};

/// Weight every body carries before inventory is counted.
pub const BASE_CARRY_WEIGHT: i32 = 75;

/// Cells in the attacker health bar of the player prompt.
const PROMPT_BAR_WIDTH: usize = 15;

/// Runtime handle of a live entity. Zero means "not registered with a store yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const UNASSIGNED: EntityId = EntityId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Death rule for damage application.
///
/// A character whose hit points fall to zero or below is knocked out. It dies when the
/// hit points reach `-(overkill_multiplier * max_hp)` or lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRules {
    pub overkill_multiplier: i32,
}

impl DamageRules {
    pub const DEFAULT_OVERKILL_MULTIPLIER: i32 = 2;

    pub fn death_threshold(&self, max_hp: i32) -> i32 {
        -(self.overkill_multiplier.saturating_mul(max_hp))
    }

    pub fn is_lethal(&self, hp: &Pool) -> bool {
        hp.current() <= self.death_threshold(hp.max())
    }
}

impl Default for DamageRules {
    fn default() -> Self {
        Self {
            overkill_multiplier: Self::DEFAULT_OVERKILL_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Still above zero hit points.
    Wounded,
    KnockedOut,
    Killed,
    /// The target was dead before the blow landed.
    AlreadyDead,
}

fn default_stats() -> [i32; 6] {
    [10; 6]
}

/// Character attributes shared by templates, NPCs and players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharData {
    #[serde(skip)]
    pub uid: EntityId,
    /// Template vnum this character was loaded as or spawned from.
    #[serde(default)]
    pub id: Vnum,
    #[serde(default)]
    pub room: Vnum,
    #[serde(default)]
    pub ship: ShipId,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub bank: u32,
    pub hp: Pool,
    #[serde(default)]
    pub mp: Pool,
    #[serde(default)]
    pub mv: Pool,
    /// str, int, dex, wis, con, cha
    #[serde(default = "default_stats")]
    pub stats: [i32; 6],
    #[serde(default)]
    pub skills: BTreeMap<String, i32>,
    #[serde(default)]
    pub languages: BTreeMap<String, i32>,
    #[serde(default)]
    pub speaking: String,
    #[serde(default)]
    pub equipment: BTreeMap<WearLoc, ItemData>,
    #[serde(default)]
    pub inventory: Vec<ItemData>,
    #[serde(default)]
    pub state: EntityState,
    /// Name of the brain to attach on spawn.
    #[serde(default)]
    pub brain: String,
    #[serde(skip)]
    pub ai: Option<BrainRef>,
    #[serde(skip)]
    pub attacker: Option<EntityId>,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl CharData {
    pub fn new(id: Vnum, name: &str) -> Self {
        Self {
            uid: EntityId::UNASSIGNED,
            id,
            room: 0,
            ship: LAND,
            name: name.to_string(),
            keywords: Vec::new(),
            title: String::new(),
            desc: String::new(),
            race: "Human".to_string(),
            gender: String::new(),
            level: 1,
            xp: 0,
            gold: 0,
            bank: 0,
            hp: Pool::full(10),
            mp: Pool::full(0),
            mv: Pool::full(10),
            stats: default_stats(),
            skills: BTreeMap::new(),
            languages: BTreeMap::new(),
            speaking: String::new(),
            equipment: BTreeMap::new(),
            inventory: Vec::new(),
            state: EntityState::Normal,
            brain: String::new(),
            ai: None,
            attacker: None,
            source: None,
        }
    }

    pub fn in_room(mut self, room: Vnum, ship: ShipId) -> Self {
        self.room = room;
        self.ship = ship;
        self
    }

    pub fn with_hp(mut self, current: i32, max: i32) -> Self {
        self.hp = Pool::new(current, max);
        self
    }

    pub fn with_mv(mut self, current: i32, max: i32) -> Self {
        self.mv = Pool::new(current, max);
        self
    }

    pub fn with_mp(mut self, current: i32, max: i32) -> Self {
        self.mp = Pool::new(current, max);
        self
    }

    pub fn with_skill(mut self, skill: &str, value: i32) -> Self {
        self.skills.insert(skill.to_string(), value);
        self
    }

    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keywords.push(keyword.to_string());
        self
    }

    pub fn with_item(mut self, item: ItemData) -> Self {
        self.inventory.push(item);
        self
    }

    pub fn with_equipment(mut self, loc: WearLoc, item: ItemData) -> Self {
        self.equipment.insert(loc, item);
        self
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.stats[stat.index()]
    }

    pub fn skill_value(&self, skill: &str) -> i32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    pub fn current_weight(&self) -> i32 {
        BASE_CARRY_WEIGHT + self.inventory.iter().map(|i| i.weight).sum::<i32>()
    }

    pub fn inventory_count(&self) -> usize {
        self.inventory.len()
    }

    pub fn armor_class(&self) -> i32 {
        let worn: i32 = self.equipment.values().map(|i| i.ac).sum();
        worn + self.stat(Stat::Dexterity) / 10 + self.stat(Stat::Strength) / 10
    }

    pub fn damage_roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let weapon = self
            .equipment
            .get(&WearLoc::Weapon)
            .and_then(|w| w.dmg.as_deref())
            .map(|dice| roll_dice(rng, dice))
            .unwrap_or(0);
        weapon.max(0) + self.stat(Stat::Strength) / 10 + self.stat(Stat::Dexterity) / 10
    }

    pub fn matches_keyword(&self, word: &str) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(word))
            || self.name.eq_ignore_ascii_case(word)
    }

    /// Subtract hit points and advance the knocked-out / dead transitions.
    fn take_damage(&mut self, damage: u32, rules: &DamageRules) -> DamageOutcome {
        if self.state == EntityState::Dead {
            self.hp.lose(damage.min(i32::MAX as u32) as i32);
            return DamageOutcome::AlreadyDead;
        }
        self.hp.lose(damage.min(i32::MAX as u32) as i32);
        if self.hp.current() > 0 {
            return DamageOutcome::Wounded;
        }
        if rules.is_lethal(&self.hp) {
            self.state = EntityState::Dead;
            DamageOutcome::Killed
        } else {
            self.state = EntityState::Unconscious;
            DamageOutcome::KnockedOut
        }
    }
}

/// A logged-in (or saved) player: character attributes plus account fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(rename = "char")]
    pub ch: CharData,
    #[serde(default)]
    pub email: String,
    /// Argon2 PHC string.
    #[serde(default)]
    pub password: String,
    #[serde(rename = "priv", default)]
    pub privilege: u32,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub banned: bool,
    #[serde(rename = "freq", default)]
    pub frequency: String,
    #[serde(skip)]
    pub client: Option<Weak<dyn Client>>,
    #[serde(skip)]
    pub need_prompt: bool,
}

impl PlayerProfile {
    pub fn new(ch: CharData) -> Self {
        Self {
            ch,
            email: String::new(),
            password: String::new(),
            privilege: 0,
            last_seen: None,
            banned: false,
            frequency: String::new(),
            client: None,
            need_prompt: false,
        }
    }

    pub fn attach_client(&mut self, client: &std::sync::Arc<dyn Client>) {
        self.client = Some(std::sync::Arc::downgrade(client));
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(|c| c.id())
    }

    pub fn send(&mut self, text: &str) {
        if let Some(client) = self.client.as_ref().and_then(|w| w.upgrade()) {
            client.send(text);
            self.need_prompt = true;
        }
    }

    /// Emit the status prompt if output is pending. `attacker_hp` is the current opponent's
    /// hit points, when fighting.
    pub fn prompt(&mut self, attacker_hp: Option<Pool>) {
        if !self.need_prompt || self.ch.state == EntityState::Dead {
            return;
        }
        let mut line = format!(
            "\r\n[Hp:{}/{}] [Mv:{}/{}] ",
            self.ch.hp.current(),
            self.ch.hp.max(),
            self.ch.mv.current(),
            self.ch.mv.max()
        );
        if let (true, Some(hp)) = (self.ch.attacker.is_some(), attacker_hp) {
            line.push_str(&format!(
                "[{}]\n",
                progress_bar(hp.current(), hp.max(), PROMPT_BAR_WIDTH)
            ));
        }
        if let Some(client) = self.client.as_ref().and_then(|w| w.upgrade()) {
            client.send(&format!("{}\r\n", line));
        }
        self.need_prompt = false;
    }
}

/// A live character held by the world store.
#[derive(Debug, Clone)]
pub enum Entity {
    Npc(CharData),
    Player(PlayerProfile),
}

impl Entity {
    pub fn char_data(&self) -> &CharData {
        match self {
            Entity::Npc(ch) => ch,
            Entity::Player(p) => &p.ch,
        }
    }

    pub fn char_data_mut(&mut self) -> &mut CharData {
        match self {
            Entity::Npc(ch) => ch,
            Entity::Player(p) => &mut p.ch,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerProfile> {
        match self {
            Entity::Player(p) => Some(p),
            Entity::Npc(_) => None,
        }
    }

    pub fn uid(&self) -> EntityId {
        self.char_data().uid
    }

    pub fn name(&self) -> &str {
        &self.char_data().name
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Entity::Player(_))
    }

    pub fn room_id(&self) -> Vnum {
        self.char_data().room
    }

    pub fn ship_id(&self) -> ShipId {
        self.char_data().ship
    }

    pub fn state(&self) -> EntityState {
        self.char_data().state
    }

    pub fn current_hp(&self) -> i32 {
        self.char_data().hp.current()
    }

    pub fn max_hp(&self) -> i32 {
        self.char_data().hp.max()
    }

    pub fn current_mv(&self) -> i32 {
        self.char_data().mv.current()
    }

    pub fn max_mv(&self) -> i32 {
        self.char_data().mv.max()
    }

    pub fn attacker(&self) -> Option<EntityId> {
        self.char_data().attacker
    }

    /// NPCs fight while in the fighting state; players fight while they have an attacker.
    pub fn is_fighting(&self) -> bool {
        match self {
            Entity::Npc(ch) => ch.state == EntityState::Fighting,
            Entity::Player(p) => p.ch.attacker.is_some(),
        }
    }

    pub fn set_attacker(&mut self, attacker: Option<EntityId>) {
        match self {
            Entity::Npc(ch) => {
                ch.attacker = attacker;
                if attacker.is_some() {
                    ch.state = EntityState::Fighting;
                } else if ch.state == EntityState::Fighting {
                    ch.state = EntityState::Normal;
                }
            }
            Entity::Player(p) => p.ch.attacker = attacker,
        }
    }

    pub fn apply_damage(&mut self, damage: u32, rules: &DamageRules) -> DamageOutcome {
        match self {
            Entity::Npc(ch) => {
                let outcome = ch.take_damage(damage, rules);
                if matches!(outcome, DamageOutcome::KnockedOut | DamageOutcome::Killed) {
                    ch.attacker = None;
                }
                outcome
            }
            Entity::Player(p) => {
                let outcome = p.ch.take_damage(damage, rules);
                match outcome {
                    DamageOutcome::Killed => p.send("\r\nYou have died.\r\n"),
                    DamageOutcome::KnockedOut => {
                        p.send("\r\nYou have been knocked unconscious...\r\n")
                    }
                    _ => {}
                }
                outcome
            }
        }
    }

    /// Restore one hit point, clamped to max.
    pub fn heal_one(&mut self) {
        self.char_data_mut().hp.gain(1);
    }

    pub fn send(&mut self, text: &str) {
        if let Entity::Player(p) = self {
            p.send(text);
        }
    }

    pub fn prompt(&mut self, attacker_hp: Option<Pool>) {
        if let Entity::Player(p) = self {
            p.prompt(attacker_hp);
        }
    }
}

fn progress_bar(current: i32, max: i32, width: usize) -> String {
    let filled = if max <= 0 {
        0
    } else {
        let ratio = current.clamp(0, max) as f64 / max as f64;
        ((ratio * width as f64).round() as usize).min(width)
    };
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::session::BufferedClient;
    use std::sync::Arc;

    fn mob(hp: i32) -> Entity {
        Entity::Npc(CharData::new(1, "a stormtrooper").with_hp(hp, hp))
    }

    #[test]
    fn damage_to_zero_knocks_out() {
        let mut e = mob(20);
        assert_eq!(e.apply_damage(20, &DamageRules::default()), DamageOutcome::KnockedOut);
        assert_eq!(e.current_hp(), 0);
        assert_eq!(e.state(), EntityState::Unconscious);
    }

    #[test]
    fn moderate_overkill_is_not_death() {
        let mut e = mob(20);
        e.apply_damage(25, &DamageRules::default());
        assert_eq!(e.current_hp(), -5);
        assert_eq!(e.state(), EntityState::Unconscious);

        let mut e = mob(20);
        e.apply_damage(45, &DamageRules::default());
        assert_eq!(e.current_hp(), -25);
        assert_eq!(e.state(), EntityState::Unconscious);
    }

    #[test]
    fn death_threshold_boundary() {
        let rules = DamageRules::default();
        let mut e = mob(20);
        assert_eq!(e.apply_damage(59, &rules), DamageOutcome::KnockedOut);
        let mut e = mob(20);
        assert_eq!(e.apply_damage(60, &rules), DamageOutcome::Killed);
        assert_eq!(e.current_hp(), -40);
        assert_eq!(e.state(), EntityState::Dead);
        assert_eq!(e.apply_damage(1, &rules), DamageOutcome::AlreadyDead);
    }

    #[test]
    fn custom_multiplier_moves_threshold() {
        let rules = DamageRules {
            overkill_multiplier: 1,
        };
        let mut e = mob(20);
        assert_eq!(e.apply_damage(40, &rules), DamageOutcome::Killed);
    }

    #[test]
    fn npc_fighting_state_tracks_attacker() {
        let mut e = mob(20);
        e.set_attacker(Some(EntityId(9)));
        assert!(e.is_fighting());
        assert_eq!(e.state(), EntityState::Fighting);
        e.set_attacker(None);
        assert!(!e.is_fighting());
        assert_eq!(e.state(), EntityState::Normal);

        e.set_attacker(Some(EntityId(9)));
        e.apply_damage(30, &DamageRules::default());
        assert_eq!(e.attacker(), None);
        assert_eq!(e.state(), EntityState::Unconscious);
    }

    #[test]
    fn player_fighting_derives_from_attacker_only() {
        let mut p = Entity::Player(PlayerProfile::new(CharData::new(0, "Kira")));
        p.set_attacker(Some(EntityId(3)));
        assert!(p.is_fighting());
        assert_eq!(p.state(), EntityState::Normal);
    }

    #[test]
    fn player_gets_knockout_message_and_prompt() {
        let buffered = Arc::new(BufferedClient::new());
        let client: Arc<dyn Client> = buffered.clone();
        let mut profile = PlayerProfile::new(CharData::new(0, "Kira").with_hp(10, 10));
        profile.attach_client(&client);
        let mut p = Entity::Player(profile);
        p.apply_damage(12, &DamageRules::default());
        p.prompt(None);
        let out = buffered.drain();
        assert!(out[0].contains("knocked unconscious"));
        assert!(out[1].contains("[Hp:-2/10]"));
    }

    #[test]
    fn prompt_shows_attacker_bar() {
        let buffered = Arc::new(BufferedClient::new());
        let client: Arc<dyn Client> = buffered.clone();
        let mut profile = PlayerProfile::new(CharData::new(0, "Kira"));
        profile.attach_client(&client);
        profile.ch.attacker = Some(EntityId(5));
        profile.send("You block.");
        profile.prompt(Some(Pool::new(5, 15)));
        let out = buffered.drain();
        assert!(out[1].contains("[#####----------]"), "{:?}", out);
    }

    #[test]
    fn weight_and_armor() {
        let ch = CharData::new(1, "a smuggler")
            .with_item(crate::world::types::ItemData::new(3, "a crate").with_weight(10))
            .with_equipment(
                WearLoc::Body,
                crate::world::types::ItemData::new(4, "flak vest").with_ac(3),
            );
        assert_eq!(ch.current_weight(), 85);
        assert_eq!(ch.armor_class(), 5);
    }
}
