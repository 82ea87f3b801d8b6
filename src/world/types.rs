use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a template object (room, item, mob, ship prototype).
pub type Vnum = u32;

/// Ship identifier used in location queries; `LAND` marks a planetary room.
pub type ShipId = u32;

pub const LAND: ShipId = 0;

/// Room name marking a pre-built placeholder slot that vnum allocation reuses.
pub const VOID_ROOM_NAME: &str = "A void";

/// Activity state of a character.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    #[default]
    Normal,
    Fighting,
    Sedated,
    Unconscious,
    Sleeping,
    Sitting,
    Piloting,
    Gunning,
    Editing,
    Crafting,
    Dead,
}

impl EntityState {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityState::Normal => "normal",
            EntityState::Fighting => "fighting",
            EntityState::Sedated => "sedated",
            EntityState::Unconscious => "unconscious",
            EntityState::Sleeping => "sleeping",
            EntityState::Sitting => "sitting",
            EntityState::Piloting => "piloting",
            EntityState::Gunning => "gunning",
            EntityState::Editing => "editing",
            EntityState::Crafting => "crafting",
            EntityState::Dead => "dead",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into a character's six attribute scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Strength,
    Intellect,
    Dexterity,
    Wisdom,
    Constitution,
    Charisma,
}

impl Stat {
    pub fn index(self) -> usize {
        match self {
            Stat::Strength => 0,
            Stat::Intellect => 1,
            Stat::Dexterity => 2,
            Stat::Wisdom => 3,
            Stat::Constitution => 4,
            Stat::Charisma => 5,
        }
    }
}

/// A current/maximum resource pair (hit points, mana, movement).
///
/// Serialized as a two element sequence `[current, max]`. Every mutator keeps
/// `current <= max`; `current` may go negative through damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Pool {
    current: i32,
    max: i32,
}

impl Pool {
    pub fn new(current: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn full(max: i32) -> Self {
        Self::new(max, max)
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Raise `current` by `amount`, clamped to `max`.
    pub fn gain(&mut self, amount: i32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Lower `current` by `amount` without a floor.
    pub fn lose(&mut self, amount: i32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Lower `current` by `amount`, floored at zero.
    pub fn drain(&mut self, amount: i32) {
        self.current = self.current.saturating_sub(amount).max(0).min(self.max);
    }

    pub fn set_max(&mut self, max: i32) {
        self.max = max.max(0);
        self.current = self.current.min(self.max);
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::full(0)
    }
}

impl From<[i32; 2]> for Pool {
    fn from(value: [i32; 2]) -> Self {
        Pool::new(value[0], value[1])
    }
}

impl From<Pool> for [i32; 2] {
    fn from(pool: Pool) -> Self {
        [pool.current, pool.max]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

/// Equipment slot an item is worn in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WearLoc {
    Head,
    Neck,
    Body,
    Arms,
    Hands,
    Waist,
    Legs,
    Feet,
    Shield,
    Weapon,
    Held,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Trash,
    Weapon,
    Armor,
    Container,
    Food,
    Drink,
    Key,
    Medpac,
    Component,
}

/// An item definition. Templates are keyed by `id`; live items are independent copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemData {
    pub id: Vnum,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub ac: i32,
    /// Weapon damage dice, e.g. `2d4+1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dmg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wear_loc: Option<WearLoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<ItemData>,
    /// File the template was read from; live copies carry none.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ItemData {
    pub fn new(id: Vnum, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            keywords: Vec::new(),
            desc: String::new(),
            kind: ItemKind::default(),
            weight: 0,
            value: 0,
            ac: 0,
            dmg: None,
            wear_loc: None,
            contents: Vec::new(),
            source: None,
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_ac(mut self, ac: i32) -> Self {
        self.ac = ac;
        self
    }

    pub fn with_damage(mut self, dice: &str) -> Self {
        self.kind = ItemKind::Weapon;
        self.dmg = Some(dice.to_string());
        self.wear_loc = Some(WearLoc::Weapon);
        self
    }

    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keywords.push(keyword.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomData {
    pub id: Vnum,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub exits: BTreeMap<Direction, Vnum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Items lying on the floor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemData>,
}

impl RoomData {
    pub fn new(id: Vnum, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            desc: String::new(),
            exits: BTreeMap::new(),
            flags: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_exit(mut self, direction: Direction, destination: Vnum) -> Self {
        self.exits.insert(direction, destination);
        self
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID_ROOM_NAME
    }
}

/// Keep up to `max` copies of mob `mob` standing in `room`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MobReset {
    pub mob: Vnum,
    pub room: Vnum,
    #[serde(default = "default_reset_max")]
    pub max: usize,
}

/// Keep one copy of item `item` lying in `room`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemReset {
    pub item: Vnum,
    pub room: Vnum,
}

fn default_reset_max() -> usize {
    1
}

/// On-disk area definition. At runtime the rooms live in the store's flat room table and
/// the area keeps only their ordered vnums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AreaData {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub levels: [u32; 2],
    #[serde(default)]
    pub rooms: Vec<RoomData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mobs: Vec<MobReset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemReset>,
}

impl AreaData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            author: String::new(),
            levels: [1, 100],
            rooms: Vec::new(),
            mobs: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_room(mut self, room: RoomData) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_mob_reset(mut self, mob: Vnum, room: Vnum, max: usize) -> Self {
        self.mobs.push(MobReset { mob, room, max });
        self
    }

    pub fn with_item_reset(mut self, item: Vnum, room: Vnum) -> Self {
        self.items.push(ItemReset { item, room });
        self
    }
}

/// A ship: prototypes are templates keyed by `id`; live ships carry the prototype vnum
/// in `oid` and their own copy of the interior rooms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipData {
    pub id: ShipId,
    #[serde(default)]
    pub oid: Vnum,
    pub name: String,
    #[serde(rename = "type", default)]
    pub ship_type: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub current_system: String,
    #[serde(default)]
    pub in_space: bool,
    /// Room the ship is docked at when not in space.
    #[serde(default)]
    pub location_id: Vnum,
    #[serde(default)]
    pub hull: Pool,
    #[serde(default)]
    pub shields: Pool,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub rooms: Vec<RoomData>,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ShipData {
    pub fn new(id: ShipId, name: &str, ship_type: &str) -> Self {
        Self {
            id,
            oid: 0,
            name: name.to_string(),
            ship_type: ship_type.to_string(),
            owner: String::new(),
            current_system: String::new(),
            in_space: false,
            location_id: 0,
            hull: Pool::full(100),
            shields: Pool::full(0),
            speed: 0,
            position: [0.0; 3],
            rooms: Vec::new(),
            source: None,
        }
    }

    pub fn with_room(mut self, room: RoomData) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn docked_at(mut self, room: Vnum) -> Self {
        self.in_space = false;
        self.location_id = room;
        self
    }

    pub fn in_system(mut self, system: &str) -> Self {
        self.in_space = true;
        self.current_system = system.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanetData {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    /// Land rooms ships may dock at.
    #[serde(default)]
    pub landing: Vec<Vnum>,
}

/// Read-only reference data for a star system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StarSystemData {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub planets: Vec<PlanetData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelpData {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub level: u32,
}
