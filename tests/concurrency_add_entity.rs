//! Concurrent mutation through the single world lock.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use starmud::world::{CharData, Entity};

/// Two threads adding 500 entities each end with exactly 1000 live entities and no
/// duplicated runtime ids.
#[test]
fn parallel_adds_are_all_kept() {
    let (_tmp, store) = common::empty_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..2)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..500 {
                    let name = format!("drone {}-{}", t, i);
                    store.add_entity(Entity::Npc(CharData::new(1, &name).with_hp(3, 3)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.entity_count(), 1000);
    let ids: HashSet<_> = store.entities().iter().map(|e| e.uid()).collect();
    assert_eq!(ids.len(), 1000);
}

/// Readers holding snapshots never observe a half-applied mutation.
#[test]
fn readers_and_writers_interleave() {
    let (_tmp, store) = common::empty_store();
    let store = Arc::new(store);
    let id = store.add_entity(Entity::Npc(CharData::new(1, "a probe droid").with_hp(50, 100)));

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..200 {
                store.with_entity_mut(id, |e| e.heal_one());
            }
        })
    };
    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..200 {
                let hp = store.get_entity(id).unwrap().current_hp();
                assert!((50..=100).contains(&hp));
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(store.get_entity(id).unwrap().current_hp(), 100);
}
