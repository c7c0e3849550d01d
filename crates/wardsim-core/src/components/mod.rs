//! Component definitions for the floor simulation.
//!
//! Actor components are pure data attached to entities in the actor arena.
//! Rooms and their equipment are owned directly by the engine and carry the
//! small amount of behavior that belongs to a single room or device.

mod common;
mod equipment;
mod hospital;
mod people;
mod room;

pub use common::*;
pub use equipment::*;
pub use hospital::*;
pub use people::*;
pub use room::*;
