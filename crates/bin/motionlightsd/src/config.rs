//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `motionlights.toml` in the working directory. Server and logging
//! settings have defaults so the file is optional; without it the daemon
//! serves an empty set of light groups.

use std::collections::HashSet;

use motionlights_domain::config::LightGroupConfig;
use motionlights_domain::entity::EntitySnapshot;
use serde::Deserialize;

const CONFIG_FILE: &str = "motionlights.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Light groups to run.
    pub groups: Vec<GroupConfig>,
    /// Initial entity states of the virtual home.
    pub entities: Vec<EntitySeed>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One `[[groups]]` table: a name plus the group settings.
#[derive(Debug, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(flatten)]
    pub settings: LightGroupConfig,
}

/// One `[[entities]]` table: the state an entity starts in.
#[derive(Debug, Deserialize)]
pub struct EntitySeed {
    pub entity_id: String,
    #[serde(flatten)]
    pub snapshot: EntitySnapshot,
}

impl Config {
    /// Load configuration from `motionlights.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOTIONLIGHTS_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("MOTIONLIGHTS_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("MOTIONLIGHTS_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("MOTIONLIGHTS_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "group name must not be empty".to_string(),
                ));
            }
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate group name: {}",
                    group.name
                )));
            }
            group.settings.validate().map_err(|err| {
                ConfigError::Validation(format!("group {}: {}", group.name, source_message(&err)))
            })?;
        }

        if self.entities.iter().any(|seed| seed.entity_id.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "entity_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Innermost message of an error chain.
fn source_message(err: &dyn std::error::Error) -> String {
    match err.source() {
        Some(source) => source_message(source),
        None => err.to_string(),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "motionlightsd=info,motionlights_app=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use motionlights_domain::config::AmbientSensorKind;
    use motionlights_domain::entity::EntityState;

    use super::*;

    const FULL: &str = "
        [server]
        host = '127.0.0.1'
        port = 9090

        [logging]
        filter = 'debug'

        [[groups]]
        name = 'hall'
        lights = ['light.hall', 'light.stairs']
        motion_sensors = ['binary_sensor.hall_motion']
        no_motion_wait = 120
        brightness_active = 70
        ambient_sensor = { entity_id = 'sensor.hall_lux', kind = 'lux' }

        [[entities]]
        entity_id = 'light.hall'
        state = 'on'
        brightness = 40

        [[entities]]
        entity_id = 'sensor.hall_lux'
        state = 35.5
    ";

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.groups.is_empty());
        assert!(config.entities.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let config: Config = toml::from_str(FULL).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");

        let hall = &config.groups[0];
        assert_eq!(hall.name, "hall");
        assert_eq!(hall.settings.lights, vec!["light.hall", "light.stairs"]);
        assert_eq!(hall.settings.no_motion_wait, 120);
        assert_eq!(hall.settings.brightness_active, 70);
        assert_eq!(hall.settings.brightness_inactive, 10);
        assert_eq!(
            hall.settings.ambient_sensor.as_ref().map(|sensor| sensor.kind),
            Some(AmbientSensorKind::Lux)
        );

        assert_eq!(config.entities[0].snapshot.state, EntityState::On);
        assert_eq!(config.entities[0].snapshot.brightness, Some(40));
        assert_eq!(config.entities[1].snapshot.state, EntityState::Numeric(35.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_group_names() {
        let toml = "
            [[groups]]
            name = 'hall'
            lights = ['light.hall']

            [[groups]]
            name = 'hall'
            lights = ['light.stairs']
        ";
        let config: Config = toml::from_str(toml).unwrap();

        let err = config.validate().unwrap_err();

        assert_eq!(err.to_string(), "invalid configuration: duplicate group name: hall");
    }

    #[test]
    fn should_reject_group_without_lights() {
        let toml = "
            [[groups]]
            name = 'hall'
            motion_sensors = ['binary_sensor.hall_motion']
        ";
        let config: Config = toml::from_str(toml).unwrap();

        let err = config.validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid configuration: group hall: at least one light must be configured"
        );
    }

    #[test]
    fn should_reject_out_of_range_group_setting() {
        let toml = "
            [[groups]]
            name = 'hall'
            lights = ['light.hall']
            motion_delay = 60
        ";
        let config: Config = toml::from_str(toml).unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_blank_group_name() {
        let toml = "
            [[groups]]
            name = ' '
            lights = ['light.hall']
        ";
        let config: Config = toml::from_str(toml).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
