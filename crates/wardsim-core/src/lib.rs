//! WardSim Core - Hospital Floor Equipment Simulation Engine
//!
//! Simulates a small hospital floor where staff, doctors and patients move
//! between rooms fitted with medical equipment. Every device runs a timed
//! power/readiness state machine, and the engine compares two policies:
//! predictive preloading (warm equipment up before staff arrive) and
//! traditional activation (start it when staff walk in).
//!
//! # Architecture
//!
//! - **Actors** live in a `hecs` world and are addressed by stable entity handles
//! - **Rooms** own their equipment and are held in a fixed table by room type
//! - **Systems** are free functions over rooms and the actor arena
//! - **Time** is read only through an injected [`clock::Clock`]
//!
//! # Example
//!
//! ```rust,no_run
//! use wardsim_core::prelude::*;
//!
//! let clock = ManualClock::new();
//! let mut engine = SimulationEngine::with_config(SimConfig::default(), clock.clone())
//!     .expect("default config is valid");
//! engine.add_actor(ActorType::Staff);
//! engine.add_actor(ActorType::Doctor);
//! engine.add_actor(ActorType::Patient);
//!
//! while engine.auto_step_execute_predictive() {
//!     clock.advance(1.0);
//!     engine.tick();
//! }
//! println!("{:?}", engine.performance_summary());
//! ```

pub mod clock;
pub mod components;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::components::*;
    pub use crate::config::{ConfigError, SimConfig};
    pub use crate::engine::{ActorSnapshot, SimulationEngine};
    pub use crate::metrics::{MovementOrigin, MovementRecord, PerformanceSummary};
}
