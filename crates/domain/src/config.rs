//! Light group configuration — the immutable settings of one coordinator.
//!
//! A configuration is replaced wholesale on reconfiguration; it is never
//! patched in place.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MotionLightsError, ValidationError};

pub const DEFAULT_NO_MOTION_WAIT: u64 = 300;
pub const DEFAULT_EXTENDED_TIMEOUT: u64 = 1200;
pub const DEFAULT_MOTION_DELAY: u64 = 0;
pub const DEFAULT_BRIGHTNESS_ACTIVE: u8 = 80;
pub const DEFAULT_BRIGHTNESS_INACTIVE: u8 = 10;
pub const DEFAULT_AMBIENT_LIGHT_THRESHOLD: u32 = 50;

const NO_MOTION_WAIT_MAX: u64 = 3600;
const EXTENDED_TIMEOUT_MAX: u64 = 7200;
const MOTION_DELAY_MAX: u64 = 30;
const BRIGHTNESS_MAX: u64 = 100;
const AMBIENT_THRESHOLD_MIN: u64 = 10;
const AMBIENT_THRESHOLD_MAX: u64 = 500;

/// How an ambient-light sensor reports darkness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientSensorKind {
    /// Binary sensor: `on` means it is dark.
    #[default]
    Binary,
    /// Illuminance sensor reporting lux.
    Lux,
}

/// Ambient-light sensor reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientSensor {
    pub entity_id: String,
    #[serde(default)]
    pub kind: AmbientSensorKind,
}

/// Settings of one light group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightGroupConfig {
    pub lights: Vec<String>,
    pub motion_sensors: Vec<String>,
    pub override_switch: Option<String>,
    pub house_active: Option<String>,
    pub ambient_sensor: Option<AmbientSensor>,
    /// Seconds without motion before automatic lights turn off.
    pub no_motion_wait: u64,
    /// Seconds a manual adjustment holds before automation resumes.
    pub extended_timeout: u64,
    /// Seconds motion must persist before lights react.
    pub motion_delay: u64,
    pub brightness_active: u8,
    pub brightness_inactive: u8,
    /// Lux threshold for lux-type ambient sensors.
    pub ambient_light_threshold: u32,
    /// Whether motion may turn lights on.
    pub motion_activation: bool,
}

impl Default for LightGroupConfig {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            motion_sensors: Vec::new(),
            override_switch: None,
            house_active: None,
            ambient_sensor: None,
            no_motion_wait: DEFAULT_NO_MOTION_WAIT,
            extended_timeout: DEFAULT_EXTENDED_TIMEOUT,
            motion_delay: DEFAULT_MOTION_DELAY,
            brightness_active: DEFAULT_BRIGHTNESS_ACTIVE,
            brightness_inactive: DEFAULT_BRIGHTNESS_INACTIVE,
            ambient_light_threshold: DEFAULT_AMBIENT_LIGHT_THRESHOLD,
            motion_activation: true,
        }
    }
}

impl LightGroupConfig {
    /// Create a builder for constructing a [`LightGroupConfig`].
    #[must_use]
    pub fn builder() -> LightGroupConfigBuilder {
        LightGroupConfigBuilder::default()
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MotionLightsError::Validation`] when:
    /// - `lights` is empty ([`ValidationError::NoLights`])
    /// - any referenced entity id is blank ([`ValidationError::EmptyEntityId`])
    /// - a numeric setting is outside its range ([`ValidationError::OutOfRange`])
    pub fn validate(&self) -> Result<(), MotionLightsError> {
        if self.lights.is_empty() {
            return Err(ValidationError::NoLights.into());
        }
        check_ids("lights", self.lights.iter())?;
        check_ids("motion_sensors", self.motion_sensors.iter())?;
        check_ids("override_switch", self.override_switch.iter())?;
        check_ids("house_active", self.house_active.iter())?;
        check_ids(
            "ambient_sensor",
            self.ambient_sensor.iter().map(|sensor| &sensor.entity_id),
        )?;

        check_range("no_motion_wait", self.no_motion_wait, 0, NO_MOTION_WAIT_MAX)?;
        check_range(
            "extended_timeout",
            self.extended_timeout,
            0,
            EXTENDED_TIMEOUT_MAX,
        )?;
        check_range("motion_delay", self.motion_delay, 0, MOTION_DELAY_MAX)?;
        check_range(
            "brightness_active",
            u64::from(self.brightness_active),
            0,
            BRIGHTNESS_MAX,
        )?;
        check_range(
            "brightness_inactive",
            u64::from(self.brightness_inactive),
            0,
            BRIGHTNESS_MAX,
        )?;
        check_range(
            "ambient_light_threshold",
            u64::from(self.ambient_light_threshold),
            AMBIENT_THRESHOLD_MIN,
            AMBIENT_THRESHOLD_MAX,
        )?;
        Ok(())
    }

    #[must_use]
    pub fn no_motion_wait(&self) -> Duration {
        Duration::from_secs(self.no_motion_wait)
    }

    #[must_use]
    pub fn extended_timeout(&self) -> Duration {
        Duration::from_secs(self.extended_timeout)
    }

    #[must_use]
    pub fn motion_delay(&self) -> Duration {
        Duration::from_secs(self.motion_delay)
    }

    /// Whether `entity_id` is one of the controlled lights.
    #[must_use]
    pub fn is_light(&self, entity_id: &str) -> bool {
        self.lights.iter().any(|light| light == entity_id)
    }

    /// Entities whose changes influence the brightness decision.
    #[must_use]
    pub fn context_entities(&self) -> Vec<String> {
        self.house_active
            .iter()
            .cloned()
            .chain(
                self.ambient_sensor
                    .iter()
                    .map(|sensor| sensor.entity_id.clone()),
            )
            .collect()
    }
}

fn check_ids<'a>(
    field: &'static str,
    mut ids: impl Iterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    if ids.any(|id| id.trim().is_empty()) {
        return Err(ValidationError::EmptyEntityId { field });
    }
    Ok(())
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Step-by-step builder for [`LightGroupConfig`].
#[derive(Debug, Default)]
pub struct LightGroupConfigBuilder {
    config: LightGroupConfig,
}

impl LightGroupConfigBuilder {
    #[must_use]
    pub fn light(mut self, entity_id: impl Into<String>) -> Self {
        self.config.lights.push(entity_id.into());
        self
    }

    #[must_use]
    pub fn motion_sensor(mut self, entity_id: impl Into<String>) -> Self {
        self.config.motion_sensors.push(entity_id.into());
        self
    }

    #[must_use]
    pub fn override_switch(mut self, entity_id: impl Into<String>) -> Self {
        self.config.override_switch = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn house_active(mut self, entity_id: impl Into<String>) -> Self {
        self.config.house_active = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn ambient_sensor(mut self, entity_id: impl Into<String>, kind: AmbientSensorKind) -> Self {
        self.config.ambient_sensor = Some(AmbientSensor {
            entity_id: entity_id.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn no_motion_wait(mut self, seconds: u64) -> Self {
        self.config.no_motion_wait = seconds;
        self
    }

    #[must_use]
    pub fn extended_timeout(mut self, seconds: u64) -> Self {
        self.config.extended_timeout = seconds;
        self
    }

    #[must_use]
    pub fn motion_delay(mut self, seconds: u64) -> Self {
        self.config.motion_delay = seconds;
        self
    }

    #[must_use]
    pub fn brightness(mut self, active: u8, inactive: u8) -> Self {
        self.config.brightness_active = active;
        self.config.brightness_inactive = inactive;
        self
    }

    #[must_use]
    pub fn ambient_light_threshold(mut self, lux: u32) -> Self {
        self.config.ambient_light_threshold = lux;
        self
    }

    #[must_use]
    pub fn motion_activation(mut self, enabled: bool) -> Self {
        self.config.motion_activation = enabled;
        self
    }

    /// Consume the builder, validate, and return a [`LightGroupConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`MotionLightsError::Validation`] if any invariant is violated.
    pub fn build(self) -> Result<LightGroupConfig, MotionLightsError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
