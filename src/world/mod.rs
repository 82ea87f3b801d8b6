//! Game world core: the live store, the character model and the simulation tick.
//! Connection handling and command parsing live outside this module and reach the world
//! only through [`WorldStore`] operations and the [`Client`] seam.

pub mod accounts;
pub mod brain;
pub mod clone;
pub mod dice;
pub mod entity;
pub mod errors;
pub mod gateway;
pub mod reset;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod tick;
pub mod types;

pub use accounts::{AccountRecord, AccountStore};
pub use brain::{brain_for, Brain, BrainRef, GenericBrain};
pub use clone::{clone_char, clone_entity, clone_item, clone_ship};
pub use entity::{CharData, DamageOutcome, DamageRules, Entity, EntityId, PlayerProfile};
pub use errors::WorldError;
pub use gateway::{WorldGateway, YamlGateway};
pub use reset::ResetReport;
pub use scheduler::{DeferredAction, DeferredQueue};
pub use session::{BufferedClient, Client, ClientId, ClientRef};
pub use store::{SaveReport, WorldCounts, WorldStore, WorldStoreBuilder};
pub use tick::{spawn_tick_loop, TickHandle, TickProcessor, TickReport, TickSettings};
pub use types::{
    AreaData, Direction, EntityState, HelpData, ItemData, Pool, RoomData, ShipData, ShipId,
    StarSystemData, Vnum, LAND,
};
