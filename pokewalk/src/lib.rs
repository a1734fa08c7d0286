//! Walk an island, meet wild creatures in tall grass, and keep the catch in
//! sync with a remote pokedex.

pub mod action;
pub mod actor;
pub mod cache;
pub mod capture;
pub mod collision;
pub mod config;
pub mod creature;
pub mod effect;
pub mod encounter;
pub mod game_loop;
pub mod geometry;
pub mod input;
pub mod inventory;
pub mod map;
pub mod reducer;
pub mod remote;
pub mod reveal;
pub mod rng;
pub mod session;
pub mod state;
pub mod sync;
pub mod ui;
pub mod zones;
