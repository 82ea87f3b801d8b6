//! The tokio-driven tick loop against a live store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use starmud::world::{
    spawn_tick_loop, BufferedClient, CharData, Client, DeferredAction, Entity, EntityState,
    PlayerProfile, TickProcessor, TickSettings, WorldStoreBuilder, YamlGateway,
};

fn fast_settings() -> TickSettings {
    TickSettings {
        interval: Duration::from_millis(10),
        reset_interval: None,
        autosave_interval: None,
        rng_seed: Some(7),
    }
}

#[tokio::test]
async fn loop_heals_sleepers_and_stops_on_shutdown() {
    let (_tmp, store) = common::empty_store();
    let store = Arc::new(store);
    let id = store.add_entity(Entity::Npc(
        CharData::new(1, "a napping ewok")
            .with_hp(1, 10)
            .with_state(EntityState::Sleeping),
    ));

    let ticker = spawn_tick_loop(Arc::clone(&store), fast_settings());
    tokio::time::sleep(Duration::from_millis(200)).await;
    let ticks = ticker.shutdown().await;

    assert!(ticks > 0);
    assert_eq!(store.get_entity(id).unwrap().current_hp(), 10);
}

#[tokio::test]
async fn loop_removes_decayed_corpses() {
    let tmp = tempfile::tempdir().unwrap();
    let gateway = YamlGateway::new(tmp.path().join("data"), tmp.path().join("docs"));
    let store = Arc::new(
        WorldStoreBuilder::new(Arc::new(gateway))
            .corpse_decay(Duration::from_millis(20))
            .build(),
    );
    let id = store.add_entity(Entity::Npc(CharData::new(1, "a krayt dragon").with_hp(50, 50)));
    store.apply_damage(id, 500);
    assert!(store.is_scheduled(id, DeferredAction::RemoveCorpse));

    let ticker = spawn_tick_loop(Arc::clone(&store), fast_settings());
    tokio::time::sleep(Duration::from_millis(250)).await;
    ticker.shutdown().await;

    assert!(store.get_entity(id).is_none());
    assert_eq!(store.scheduler_stats().queued, 0);
}

/// Unconscious characters heal every tick and the player sees an updated prompt.
#[test]
fn unconscious_player_gets_prompted_while_healing() {
    let (_tmp, store) = common::empty_store();
    let buffered = Arc::new(BufferedClient::new());
    let client: Arc<dyn Client> = buffered.clone();
    let mut profile = PlayerProfile::new(
        CharData::new(0, "Kira")
            .with_hp(-3, 20)
            .with_mv(40, 40)
            .with_state(EntityState::Unconscious),
    );
    profile.attach_client(&client);
    profile.need_prompt = true;
    let id = store.add_entity(Entity::Player(profile));

    let mut processor = TickProcessor::new(Some(1));
    let report = processor.process_entities(&store);
    assert_eq!(report.entities, 1);
    assert_eq!(report.heal_increments, 1);
    assert_eq!(store.get_entity(id).unwrap().current_hp(), -2);

    let sent = buffered.drain().concat();
    assert!(sent.contains("[Hp:-2/20] [Mv:"));
}

#[test]
fn dead_and_busy_states_do_not_heal() {
    let (_tmp, store) = common::empty_store();
    let dead = store.add_entity(Entity::Npc(
        CharData::new(1, "a corpse").with_hp(-50, 20).with_state(EntityState::Dead),
    ));
    let pilot = store.add_entity(Entity::Npc(
        CharData::new(2, "a pilot").with_hp(5, 20).with_state(EntityState::Piloting),
    ));

    let mut processor = TickProcessor::new(Some(3));
    for _ in 0..50 {
        processor.process_entities(&store);
    }
    assert_eq!(store.get_entity(dead).unwrap().current_hp(), -50);
    assert_eq!(store.get_entity(pilot).unwrap().current_hp(), 5);
}
