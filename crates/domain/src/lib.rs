//! # motionlights-domain
//!
//! Pure domain model for motion-driven lighting.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Describe observed **entities** (lights, motion sensors, switches) as
//!   state snapshots and change notifications
//! - Define the **light group configuration** and its validation rules
//! - Define the **lighting state machine**: states, events, transition table
//! - Decide **brightness** (house-active, ambient binary, ambient lux with
//!   hysteresis, default)
//! - Classify light changes as **manual** or self-issued
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod brightness;
pub mod config;
pub mod entity;
pub mod manual;
pub mod state_machine;
