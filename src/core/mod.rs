//! World manager
pub mod world;

pub use world::{spawn_position_for_seed, CallbackId, World, WorldStatistics};
