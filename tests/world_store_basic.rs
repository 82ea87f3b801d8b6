//! Lookups against the sample world: rooms, ships, help and live entities.

mod common;

use starmud::metrics;
use starmud::world::{CharData, Entity, EntityId, HelpData, PlayerProfile, LAND};

#[test]
fn fixture_world_loads_every_collection() {
    let (_tmp, store) = common::loaded_store();
    let counts = store.counts();
    assert_eq!(counts.areas, 2);
    assert_eq!(counts.rooms, 5);
    assert_eq!(counts.items, 3);
    assert_eq!(counts.mobs, 2);
    assert_eq!(counts.ship_prototypes, 2);
    assert_eq!(counts.ships, 2);
    assert_eq!(counts.helps, 2);
    assert_eq!(counts.starsystems, 1);
    assert_eq!(counts.entities, 0);
}

/// Removing an id that is not live reports the error and leaves the list alone.
#[test]
fn removing_unknown_entity_changes_nothing() {
    let (_tmp, store) = common::empty_store();
    let id = store.add_entity(Entity::Npc(CharData::new(1, "a womp rat").with_hp(5, 5)));
    let errors_before = metrics::snapshot().reported_errors;
    assert!(store.remove_entity(EntityId(9_999)).is_none());
    assert!(metrics::snapshot().reported_errors > errors_before);
    assert_eq!(store.entity_count(), 1);
    assert_eq!(store.get_entity(id).map(|e| e.name().to_string()), Some("a womp rat".into()));
}

/// Putting a snapshot of a live entity back in is refused; the id stays unique.
#[test]
fn re_adding_a_live_snapshot_keeps_one_record() {
    let (_tmp, store) = common::empty_store();
    let id = store.add_entity(Entity::Npc(CharData::new(1, "a womp rat").with_hp(5, 5)));
    let errors_before = metrics::snapshot().reported_errors;

    let again = store.add_entity(store.get_entity(id).unwrap());
    assert_eq!(again, id);
    assert_eq!(store.entity_count(), 1);
    assert!(metrics::snapshot().reported_errors > errors_before);

    assert!(store.remove_entity(id).is_some());
    assert!(store.get_entity(id).is_none());
    assert_eq!(store.entity_count(), 0);
}

#[test]
fn re_adding_a_live_player_keeps_one_record() {
    let (_tmp, store) = common::empty_store();
    let id = store.add_entity(Entity::Player(PlayerProfile::new(
        CharData::new(0, "Dash").with_hp(25, 25),
    )));
    let profile = store.get_player("Dash").unwrap();
    assert_eq!(store.add_entity(Entity::Player(profile)), id);
    assert_eq!(store.entity_count(), 1);
}

/// Removed entities may come back; they are live again under the same id.
#[test]
fn removed_entity_can_be_added_back() {
    let (_tmp, store) = common::empty_store();
    let id = store.add_entity(Entity::Npc(CharData::new(1, "a womp rat").with_hp(5, 5)));
    let removed = store.remove_entity(id).unwrap();
    assert_eq!(store.add_entity(removed), id);
    assert_eq!(store.entity_count(), 1);
}

#[test]
fn help_matches_keyword_prefix_ignoring_case() {
    let (_tmp, store) = common::loaded_store();
    let names = |prefix: &str| -> Vec<String> {
        store.get_help(prefix).into_iter().map(|h| h.name).collect()
    };
    assert_eq!(names("BLA"), vec!["Blasters"]);
    assert_eq!(names("ship"), vec!["Ships"]);
    assert_eq!(names("w"), vec!["Blasters"]);
    assert!(names("").is_empty());
    assert!(names("xyz").is_empty());

    store.add_help(HelpData {
        name: "Shields".into(),
        keywords: vec!["shields".into()],
        desc: String::new(),
        level: 0,
    });
    assert_eq!(names("sh").len(), 2);
}

#[test]
fn rooms_resolve_on_land_and_inside_ships() {
    let (_tmp, store) = common::loaded_store();
    assert_eq!(store.get_room(101, LAND).unwrap().name, "Chalmun's Cantina");
    assert_eq!(store.get_room(2, 1).unwrap().name, "Main Hold");
    assert_eq!(store.get_room(4, 2).unwrap().name, "Engine Room");
    assert!(store.get_room(2, LAND).is_none());
    assert!(store.get_room(1, 42).is_none());
    assert_eq!(store.area_of_room(200).as_deref(), Some("Dune Sea"));
}

#[test]
fn ship_queries_split_docked_and_in_space() {
    let (_tmp, store) = common::loaded_store();
    let docked: Vec<String> = store.get_ships_in_room(100).into_iter().map(|s| s.name).collect();
    assert_eq!(docked, vec!["Millennium Falcon"]);
    let flying: Vec<String> = store
        .get_ships_in_system("Tatoo")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(flying, vec!["Outrider"]);
    assert!(store.get_ships_in_room(101).is_empty());

    assert!(!store.ship_name_available("millennium FALCON"));
    assert!(store.ship_name_available("Slave I"));
    assert_eq!(store.get_ship(1).unwrap().oid, 3);
    assert_eq!(store.get_ship_prototype(1).unwrap().ship_type, "Lambda shuttle");
}

#[test]
fn templates_and_reference_data_are_available() {
    let (_tmp, store) = common::loaded_store();
    let trooper = store.get_mob(2).unwrap();
    assert_eq!(trooper.hp.max(), 20);
    assert_eq!(trooper.skill_value("healing"), 1);
    // 4 from the armor, one each from strength 14 and dexterity 12
    assert_eq!(trooper.armor_class(), 6);
    assert!(store.get_item(1).unwrap().source.is_some());
    let tatoo = store.get_starsystem("tatoo").unwrap();
    assert_eq!(tatoo.planets[0].landing, vec![100]);
}

#[test]
fn removing_an_area_drops_its_rooms() {
    let (_tmp, store) = common::loaded_store();
    assert!(store.remove_area("Dune Sea"));
    assert!(store.get_room(200, LAND).is_none());
    assert!(store.area_of_room(201).is_none());
    assert!(store.get_room(100, LAND).is_some());
    assert!(!store.remove_area("Dune Sea"));
}
