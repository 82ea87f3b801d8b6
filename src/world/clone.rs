//! Template to live-instance copying.
//!
//! Owned data (equipment, inventory, keywords, skills, interior rooms) is copied so the
//! clone can be mutated without touching the template. Relationships are carried over
//! as-is: the brain handle is the same `Arc`, and the attacker is the same entity id.

use std::sync::Arc;

use log::debug;

use crate::world::entity::{CharData, Entity, EntityId, PlayerProfile};
use crate::world::types::{ItemData, RoomData, ShipData};

/// Deep copy of an item, nested container contents included. The copy is not tied to a
/// template file.
pub fn clone_item(item: &ItemData) -> ItemData {
    ItemData {
        keywords: item.keywords.to_vec(),
        contents: item.contents.iter().map(clone_item).collect(),
        source: None,
        ..item.clone()
    }
}

/// Copy a character for spawning. The result has no runtime id yet; the store assigns
/// one when the clone is registered.
pub fn clone_char(template: &CharData) -> CharData {
    let ch = CharData {
        uid: EntityId::UNASSIGNED,
        keywords: template.keywords.to_vec(),
        skills: template.skills.clone(),
        languages: template.languages.clone(),
        equipment: template
            .equipment
            .iter()
            .map(|(loc, item)| (*loc, clone_item(item)))
            .collect(),
        inventory: template.inventory.iter().map(clone_item).collect(),
        ai: template.ai.as_ref().map(Arc::clone),
        attacker: template.attacker,
        source: None,
        ..template.clone()
    };
    debug!(
        "cloned '{}' (vnum {}) with {} carried and {} worn items",
        ch.name,
        ch.id,
        ch.inventory.len(),
        ch.equipment.len()
    );
    ch
}

/// Copy either variant. A player copy keeps its account fields and session handle.
pub fn clone_entity(entity: &Entity) -> Entity {
    match entity {
        Entity::Npc(ch) => Entity::Npc(clone_char(ch)),
        Entity::Player(p) => Entity::Player(PlayerProfile {
            ch: clone_char(&p.ch),
            ..p.clone()
        }),
    }
}

fn clone_room(room: &RoomData) -> RoomData {
    RoomData {
        items: room.items.iter().map(clone_item).collect(),
        ..room.clone()
    }
}

/// Copy a ship prototype. `oid` records the prototype vnum; the live id is left for the
/// store to assign.
pub fn clone_ship(prototype: &ShipData) -> ShipData {
    ShipData {
        id: 0,
        oid: prototype.id,
        rooms: prototype.rooms.iter().map(clone_room).collect(),
        source: None,
        ..prototype.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::brain::{Brain, GenericBrain};
    use crate::world::types::{RoomData, WearLoc};

    fn template() -> CharData {
        let mut ch = CharData::new(100, "a gamorrean guard")
            .with_keyword("gamorrean")
            .with_keyword("guard")
            .with_hp(30, 30)
            .with_item(ItemData::new(7, "a ration pack").with_weight(1))
            .with_equipment(WearLoc::Weapon, ItemData::new(8, "a vibro-axe").with_damage("2d6"));
        ch.ai = Some(Arc::new(GenericBrain::new()));
        ch.attacker = Some(EntityId(12));
        ch
    }

    #[test]
    fn clone_has_independent_owned_data() {
        let tpl = template();
        let mut copy = clone_char(&tpl);

        copy.inventory.push(ItemData::new(9, "a datapad"));
        copy.inventory[0].name = "an eaten ration".into();
        copy.keywords.push("pig".into());
        copy.equipment.remove(&WearLoc::Weapon);

        assert_eq!(tpl.inventory.len(), 1);
        assert_eq!(tpl.inventory[0].name, "a ration pack");
        assert_eq!(tpl.keywords.len(), 2);
        assert!(tpl.equipment.contains_key(&WearLoc::Weapon));
    }

    #[test]
    fn clone_shares_relationships_and_copies_scalars() {
        let tpl = template();
        let copy = clone_char(&tpl);

        assert_eq!(copy.name, tpl.name);
        assert_eq!(copy.hp, tpl.hp);
        assert_eq!(copy.attacker, tpl.attacker);
        let (a, b) = (tpl.ai.unwrap(), copy.ai.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.name(), "generic");
    }

    #[test]
    fn ship_clone_records_prototype() {
        let proto = ShipData::new(4, "Lambda shuttle", "shuttle")
            .with_room(RoomData::new(1, "Cockpit"))
            .with_room(RoomData::new(2, "Hold"));
        let mut live = clone_ship(&proto);
        assert_eq!(live.oid, 4);
        assert_eq!(live.id, 0);
        live.rooms[0].name = "Scorched cockpit".into();
        assert_eq!(proto.rooms[0].name, "Cockpit");
    }
}
