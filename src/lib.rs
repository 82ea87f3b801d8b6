//! # StarMUD - World Core for a Space-Opera MUD
//!
//! StarMUD holds the authoritative in-memory game world of a persistent multiplayer text
//! game: every live character, room, area, item, ship and star system. Many connection
//! tasks read and mutate it concurrently while a background tick advances vitals and
//! life/death state.
//!
//! ## Features
//!
//! - **Single-lock World Store**: one mutex over every collection; snapshots out,
//!   lock-guarded mutation in.
//! - **Entity State Machine**: knock-out and death thresholds on damage, corpse decay
//!   through a deferred-task queue.
//! - **Spawn/Clone**: templates deep-copied into independent live instances.
//! - **Simulation Tick**: per-entity regeneration driven by a Tokio interval, with
//!   periodic area resets and autosave.
//! - **YAML World Files**: areas, items, mobs, ships, planets, help and players.
//! - **Accounts**: sled-backed records with Argon2id password hashes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use starmud::world::{spawn_tick_loop, TickSettings, WorldStore, YamlGateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(WorldStore::new(Arc::new(YamlGateway::new("data", "docs"))));
//!     store.load()?;
//!     store.reset_all();
//!
//!     let ticker = spawn_tick_loop(Arc::clone(&store), TickSettings::default());
//!     tokio::signal::ctrl_c().await?;
//!     ticker.shutdown().await;
//!     store.save();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - the store, characters, cloning, ticks, persistence gateway, accounts
//! - [`config`] - TOML configuration
//! - [`metrics`] - process-wide simulation counters

pub mod config;
pub mod metrics;
pub mod world;
