//! # motionlights-app
//!
//! Application layer — the per-group lighting coordinator and the **port
//! definitions** (traits) it is driven through.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityStates` — read entities and subscribe to their changes
//!   - `LightCommander` — turn a set of lights on or off
//!   - `Scheduler` — run a task once after a delay
//!   - `EntityStateWriter` — write entity states from outside (simulation, API)
//! - Provide the coordinator building blocks:
//!   - `TimerManager` — named, cancelable timers
//!   - `TriggerManager` — motion and override subscriptions
//!   - `LightController` — brightness decision and token-stamped commands
//!   - `ManualDetector` — tell people apart from our own commands
//! - Run one `Coordinator` per light group on its own task (`runtime`) and
//!   keep them in a `LightGroups` registry
//!
//! ## Dependency rule
//! Depends on `motionlights-domain` only (plus `tokio` for channels, time and
//! tasks). Never imports adapter crates. Adapters depend on *this* crate, not
//! the reverse.

pub mod attribution;
pub mod coordinator;
pub mod light_controller;
pub mod manual_detection;
pub mod ports;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod status;
pub mod timer_manager;
pub mod trigger_manager;

#[cfg(test)]
mod testing;
