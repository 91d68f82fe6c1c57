//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`MotionLightsError`] via `#[from]`.

/// Top-level error for every fallible operation of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum MotionLightsError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("scheduler error")]
    Scheduler(#[from] SchedulerError),

    /// The coordinator instance no longer accepts messages.
    #[error("coordinator instance is stopped")]
    Stopped,
}

/// A configuration rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one light must be configured")]
    NoLights,

    #[error("{field} must not contain an empty entity id")]
    EmptyEntityId { field: &'static str },

    #[error("{field} is {value}, expected a value between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// A looked-up item does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Delayed work could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("no async runtime available to run delayed work")]
    NoRuntime,

    #[error("scheduler rejected the task: {0}")]
    Rejected(&'static str),
}
