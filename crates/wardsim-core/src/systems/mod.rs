//! Systems - logic that operates on rooms and the actor arena

mod energy;
mod occupancy;
mod prediction;
mod tour;

pub use energy::*;
pub use occupancy::*;
pub use prediction::*;
pub use tour::*;
