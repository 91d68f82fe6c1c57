//! Light controller — brightness decision and light commands for one group.

use motionlights_domain::brightness::{BrightnessMode, BrightnessSelector, BrightnessStrategy};
use motionlights_domain::config::LightGroupConfig;
use motionlights_domain::id::AttributionToken;

use crate::attribution::AttributionRegistry;
use crate::ports::{EntityStates, LightCommand, LightCommander};

/// Issues token-stamped commands to every light of a group.
pub struct LightController<H> {
    host: H,
    lights: Vec<String>,
    brightness_active: u8,
    brightness_inactive: u8,
    selector: BrightnessSelector,
    registry: AttributionRegistry,
    selected_mode: Option<BrightnessMode>,
    applied_mode: Option<BrightnessMode>,
}

impl<H> LightController<H>
where
    H: EntityStates + LightCommander + Send + Sync,
{
    #[must_use]
    pub fn new(host: H, config: &LightGroupConfig, registry: AttributionRegistry) -> Self {
        Self {
            host,
            lights: config.lights.clone(),
            brightness_active: config.brightness_active,
            brightness_inactive: config.brightness_inactive,
            selector: BrightnessSelector::new(BrightnessStrategy::from_config(config)),
            registry,
            selected_mode: None,
            applied_mode: None,
        }
    }

    /// Adopt a new configuration, forgetting any lux hysteresis memory.
    pub fn reconfigure(&mut self, config: &LightGroupConfig) {
        self.lights.clone_from(&config.lights);
        self.brightness_active = config.brightness_active;
        self.brightness_inactive = config.brightness_inactive;
        self.selector = BrightnessSelector::new(BrightnessStrategy::from_config(config));
        self.selected_mode = None;
        self.applied_mode = None;
    }

    /// Mode of the most recent brightness decision.
    #[must_use]
    pub fn selected_mode(&self) -> Option<BrightnessMode> {
        self.selected_mode
    }

    /// Mode last used for an on-command, if any.
    #[must_use]
    pub fn applied_mode(&self) -> Option<BrightnessMode> {
        self.applied_mode
    }

    /// Read the strategy's source entity and decide the brightness mode.
    pub async fn select_mode(&mut self) -> BrightnessMode {
        let reading = match self.selector.strategy().source() {
            Some(entity_id) => self
                .host
                .get_state(entity_id)
                .await
                .map(|snapshot| snapshot.state),
            None => None,
        };
        let mode = match self.selector.select(reading.as_ref()) {
            Ok(mode) => mode,
            Err(fallback) => {
                tracing::warn!(%fallback, "using inactive brightness");
                BrightnessMode::Inactive
            }
        };
        self.selected_mode = Some(mode);
        mode
    }

    fn percent(&self, mode: BrightnessMode) -> u8 {
        match mode {
            BrightnessMode::Active => self.brightness_active,
            BrightnessMode::Inactive => self.brightness_inactive,
        }
    }

    /// Decide the brightness and turn every light on.
    ///
    /// Returns the brightness sent, or `None` when the decided brightness is
    /// zero and no command was issued.
    pub async fn turn_on_auto(&mut self, context: &str) -> Option<u8> {
        let mode = self.select_mode().await;
        self.turn_on(mode, context).await
    }

    /// Turn every light on at the brightness of `mode`.
    pub async fn turn_on(&mut self, mode: BrightnessMode, context: &str) -> Option<u8> {
        self.applied_mode = Some(mode);
        let brightness = self.percent(mode);
        if brightness == 0 {
            tracing::debug!(context, %mode, "brightness is zero, not turning lights on");
            return None;
        }
        tracing::info!(context, %mode, brightness, "turning lights on");
        self.send(true, Some(brightness)).await;
        Some(brightness)
    }

    pub async fn turn_off(&mut self, context: &str) {
        tracing::info!(context, "turning lights off");
        self.applied_mode = None;
        self.send(false, None).await;
    }

    /// Whether `token` belongs to a command issued by this group.
    #[must_use]
    pub fn is_own_command(&self, token: &AttributionToken) -> bool {
        self.registry.is_recent(token)
    }

    async fn send(&self, on: bool, brightness_pct: Option<u8>) {
        let command = LightCommand {
            entity_ids: self.lights.clone(),
            on,
            brightness_pct,
            token: self.registry.issue(),
        };
        if let Err(err) = self.host.command_lights(command).await {
            tracing::warn!(%err, on, "light command failed");
        }
    }
}
