//! # motionlights-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the running light groups
//!   (`/api/groups`, `/api/groups/{name}/events`, …) and the simulated
//!   entities (`/api/entities`)
//! - Stream each group's diagnostics as **Server-Sent Events**
//!   (`/api/groups/{name}/stream`)
//! - Map HTTP requests into coordinator handle calls (driving adapter)
//! - Map [`MotionLightsError`](motionlights_domain::error::MotionLightsError)
//!   into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `motionlights-app` (for the coordinator handles and port
//! traits) and `motionlights-domain` (for request/response types). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
