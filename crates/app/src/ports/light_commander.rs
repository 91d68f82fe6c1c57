//! Light-command port.

use std::future::Future;
use std::sync::Arc;

use motionlights_domain::error::MotionLightsError;
use motionlights_domain::id::AttributionToken;

/// One command addressed to every light of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightCommand {
    pub entity_ids: Vec<String>,
    pub on: bool,
    /// Target brightness in percent, only meaningful when `on`.
    pub brightness_pct: Option<u8>,
    /// Echoed back by the host on the resulting state changes.
    pub token: AttributionToken,
}

/// Sends commands to lights.
///
/// Commands are fire-and-forget: `Ok` means the host accepted the command,
/// not that the lights reached the requested state.
pub trait LightCommander {
    fn command_lights(
        &self,
        command: LightCommand,
    ) -> impl Future<Output = Result<(), MotionLightsError>> + Send;
}

impl<T: LightCommander + Send + Sync> LightCommander for Arc<T> {
    fn command_lights(
        &self,
        command: LightCommand,
    ) -> impl Future<Output = Result<(), MotionLightsError>> + Send {
        (**self).command_lights(command)
    }
}
