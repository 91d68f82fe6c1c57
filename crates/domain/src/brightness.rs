//! Brightness selection.
//!
//! A light group has two brightness levels. Which one applies is decided by
//! a single strategy picked from the configuration shape, in priority order:
//! house-active switch, then ambient sensor, then a fixed default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{AmbientSensorKind, LightGroupConfig};
use crate::entity::EntityState;

/// Half-width of the lux dead zone around the threshold.
pub const LUX_HYSTERESIS: f64 = 20.0;

/// Which of the two configured brightness levels applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessMode {
    Active,
    #[default]
    Inactive,
}

impl fmt::Display for BrightnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// How the brightness mode is derived.
#[derive(Debug, Clone, PartialEq)]
pub enum BrightnessStrategy {
    /// `on` means people are up and about.
    HouseActive { entity_id: String },
    /// `on` means it is dark.
    AmbientBinary { entity_id: String },
    /// Illuminance compared against a threshold with hysteresis.
    AmbientLux { entity_id: String, threshold: f64 },
    /// Nothing configured, always [`BrightnessMode::Active`].
    Default,
}

impl BrightnessStrategy {
    /// Pick the strategy implied by `config`.
    #[must_use]
    pub fn from_config(config: &LightGroupConfig) -> Self {
        if let Some(entity_id) = &config.house_active {
            return Self::HouseActive {
                entity_id: entity_id.clone(),
            };
        }
        match &config.ambient_sensor {
            Some(sensor) if sensor.kind == AmbientSensorKind::Lux => Self::AmbientLux {
                entity_id: sensor.entity_id.clone(),
                threshold: f64::from(config.ambient_light_threshold),
            },
            Some(sensor) => Self::AmbientBinary {
                entity_id: sensor.entity_id.clone(),
            },
            None => Self::Default,
        }
    }

    /// Entity whose reading feeds this strategy.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::HouseActive { entity_id }
            | Self::AmbientBinary { entity_id }
            | Self::AmbientLux { entity_id, .. } => Some(entity_id),
            Self::Default => None,
        }
    }
}

/// Why a reading could not be used; the caller falls back to
/// [`BrightnessMode::Inactive`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrightnessFallback {
    #[error("{entity_id} has no state")]
    Missing { entity_id: String },

    #[error("{entity_id} reported non-numeric illuminance {state}")]
    NotNumeric {
        entity_id: String,
        state: EntityState,
    },

    #[error("{entity_id} reported unexpected state {state}")]
    Unexpected {
        entity_id: String,
        state: EntityState,
    },
}

/// Strategy plus the memory needed for lux hysteresis.
#[derive(Debug, Clone)]
pub struct BrightnessSelector {
    strategy: BrightnessStrategy,
    lux_mode: Option<BrightnessMode>,
}

impl BrightnessSelector {
    #[must_use]
    pub fn new(strategy: BrightnessStrategy) -> Self {
        Self {
            strategy,
            lux_mode: None,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &BrightnessStrategy {
        &self.strategy
    }

    /// Decide the mode from the current reading of the strategy's source.
    ///
    /// # Errors
    ///
    /// Returns a [`BrightnessFallback`] when the reading is missing or
    /// unusable. The mode to apply in that case is
    /// [`BrightnessMode::Inactive`].
    pub fn select(
        &mut self,
        reading: Option<&EntityState>,
    ) -> Result<BrightnessMode, BrightnessFallback> {
        let (entity_id, threshold) = match &self.strategy {
            BrightnessStrategy::Default => return Ok(BrightnessMode::Active),
            BrightnessStrategy::HouseActive { entity_id } => {
                return binary(entity_id, reading, BrightnessMode::Active);
            }
            BrightnessStrategy::AmbientBinary { entity_id } => {
                return binary(entity_id, reading, BrightnessMode::Inactive);
            }
            BrightnessStrategy::AmbientLux {
                entity_id,
                threshold,
            } => (entity_id, *threshold),
        };

        let state = reading.ok_or_else(|| BrightnessFallback::Missing {
            entity_id: entity_id.clone(),
        })?;
        let lux = state
            .as_number()
            .ok_or_else(|| BrightnessFallback::NotNumeric {
                entity_id: entity_id.clone(),
                state: state.clone(),
            })?;

        let mode = if lux < threshold - LUX_HYSTERESIS {
            BrightnessMode::Inactive
        } else if lux > threshold + LUX_HYSTERESIS {
            BrightnessMode::Active
        } else {
            self.lux_mode.unwrap_or(BrightnessMode::Inactive)
        };
        self.lux_mode = Some(mode);
        Ok(mode)
    }
}

/// Map an on/off reading: `on` yields `when_on`, `off` the other mode.
fn binary(
    entity_id: &str,
    reading: Option<&EntityState>,
    when_on: BrightnessMode,
) -> Result<BrightnessMode, BrightnessFallback> {
    let when_off = match when_on {
        BrightnessMode::Active => BrightnessMode::Inactive,
        BrightnessMode::Inactive => BrightnessMode::Active,
    };
    match reading {
        Some(EntityState::On) => Ok(when_on),
        Some(EntityState::Off) => Ok(when_off),
        Some(state) => Err(BrightnessFallback::Unexpected {
            entity_id: entity_id.to_string(),
            state: state.clone(),
        }),
        None => Err(BrightnessFallback::Missing {
            entity_id: entity_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lux_selector(threshold: u32) -> BrightnessSelector {
        let config = LightGroupConfig::builder()
            .light("light.hall")
            .ambient_sensor("sensor.hall_lux", AmbientSensorKind::Lux)
            .ambient_light_threshold(threshold)
            .build()
            .unwrap();
        BrightnessSelector::new(BrightnessStrategy::from_config(&config))
    }

    fn lux(value: f64) -> EntityState {
        EntityState::Numeric(value)
    }

    #[test]
    fn should_prefer_house_active_over_ambient_sensor() {
        let config = LightGroupConfig::builder()
            .light("light.hall")
            .house_active("input_boolean.house_active")
            .ambient_sensor("binary_sensor.dark", AmbientSensorKind::Binary)
            .build()
            .unwrap();
        assert_eq!(
            BrightnessStrategy::from_config(&config),
            BrightnessStrategy::HouseActive {
                entity_id: "input_boolean.house_active".to_string()
            }
        );
    }

    #[test]
    fn should_use_default_strategy_when_nothing_configured() {
        let config = LightGroupConfig::builder()
            .light("light.hall")
            .build()
            .unwrap();
        let mut selector = BrightnessSelector::new(BrightnessStrategy::from_config(&config));
        assert_eq!(selector.select(None), Ok(BrightnessMode::Active));
        assert!(selector.strategy().source().is_none());
    }

    #[test]
    fn should_follow_house_active_switch() {
        let mut selector = BrightnessSelector::new(BrightnessStrategy::HouseActive {
            entity_id: "input_boolean.house_active".to_string(),
        });
        assert_eq!(
            selector.select(Some(&EntityState::On)),
            Ok(BrightnessMode::Active)
        );
        assert_eq!(
            selector.select(Some(&EntityState::Off)),
            Ok(BrightnessMode::Inactive)
        );
    }

    #[test]
    fn should_dim_when_binary_ambient_sensor_reports_dark() {
        let mut selector = BrightnessSelector::new(BrightnessStrategy::AmbientBinary {
            entity_id: "binary_sensor.dark".to_string(),
        });
        assert_eq!(
            selector.select(Some(&EntityState::On)),
            Ok(BrightnessMode::Inactive)
        );
        assert_eq!(
            selector.select(Some(&EntityState::Off)),
            Ok(BrightnessMode::Active)
        );
    }

    #[test]
    fn should_retain_previous_mode_when_lux_in_dead_zone() {
        let mut selector = lux_selector(100);
        assert_eq!(selector.select(Some(&lux(75.0))), Ok(BrightnessMode::Inactive));
        assert_eq!(selector.select(Some(&lux(100.0))), Ok(BrightnessMode::Inactive));
        assert_eq!(selector.select(Some(&lux(125.0))), Ok(BrightnessMode::Active));
        assert_eq!(selector.select(Some(&lux(100.0))), Ok(BrightnessMode::Active));
    }

    #[test]
    fn should_treat_dead_zone_boundaries_as_retained() {
        let mut selector = lux_selector(100);
        assert_eq!(selector.select(Some(&lux(130.0))), Ok(BrightnessMode::Active));
        assert_eq!(selector.select(Some(&lux(80.0))), Ok(BrightnessMode::Active));
        assert_eq!(selector.select(Some(&lux(120.0))), Ok(BrightnessMode::Active));
        assert_eq!(selector.select(Some(&lux(79.9))), Ok(BrightnessMode::Inactive));
    }

    #[test]
    fn should_default_to_inactive_when_first_lux_reading_in_dead_zone() {
        let mut selector = lux_selector(50);
        assert_eq!(selector.select(Some(&lux(50.0))), Ok(BrightnessMode::Inactive));
    }

    #[test]
    fn should_report_fallback_when_lux_not_numeric() {
        let mut selector = lux_selector(50);
        let result = selector.select(Some(&EntityState::Text("bright".to_string())));
        assert!(matches!(result, Err(BrightnessFallback::NotNumeric { .. })));
    }

    #[test]
    fn should_report_fallback_when_source_missing() {
        let mut selector = BrightnessSelector::new(BrightnessStrategy::HouseActive {
            entity_id: "input_boolean.house_active".to_string(),
        });
        assert!(matches!(
            selector.select(None),
            Err(BrightnessFallback::Missing { .. })
        ));
    }
}
