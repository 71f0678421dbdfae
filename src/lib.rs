//! Client-side core for a community film map.
//!
//! Film records and their moderation lifecycle live in a remote record
//! store; this crate owns everything between that store and the embedded
//! map widget: the film repository, the moderation state machine, the map
//! synchronization engine, and the submission workflow. The accompanying
//! binary serves the geocoding proxy that keeps the provider credential
//! off the clients.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;
