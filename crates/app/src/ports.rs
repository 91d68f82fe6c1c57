//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the coordinator and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod entity_states;
pub mod light_commander;
pub mod scheduler;

pub use entity_states::{EntityStateWriter, EntityStates, StateCallback};
pub use light_commander::{LightCommand, LightCommander};
pub use scheduler::{ScheduleHandle, ScheduledTask, Scheduler};
