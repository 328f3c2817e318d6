//! Respawn configuration: timing knobs, the transport-limit mode and the
//! loadout handed to every revived character.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix of every environment variable read into [`RespawnSettings`].
pub const ENV_PREFIX: &str = "RESPAWN";

/// Below this many seconds the transport budget is treated as unlimited.
pub const UNLIMITED_TRANSPORT_EPSILON: f32 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("respawn interval must be positive, got {0}")]
    RespawnInterval(f32),
    #[error("max transport time must be non-negative, got {0}")]
    MaxTransportTime(f32),
    #[error("min respawn ratio must be within [0, 1], got {0}")]
    MinRespawnRatio(f32),
    #[error("tick rate must be positive, got {0}")]
    TickRate(f32),
    #[error("loadout entry {index} has an empty item identifier")]
    EmptyLoadoutItem { index: usize },
}

// ---------------------------------------------------------------------------
// Transport limit
// ---------------------------------------------------------------------------

/// How long the shuttle may stay out before it is sent home.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportLimit {
    /// The shuttle never returns on its own; it stays `Transporting`.
    Unlimited,
    /// Seconds budget for the transport leg, and again for the return leg.
    Limited(f32),
}

impl TransportLimit {
    pub fn from_seconds(seconds: f32) -> Self {
        if seconds < UNLIMITED_TRANSPORT_EPSILON {
            TransportLimit::Unlimited
        } else {
            TransportLimit::Limited(seconds)
        }
    }

    /// Value the transport and return timers are reset to.
    pub fn budget(self) -> f32 {
        match self {
            TransportLimit::Unlimited => 0.0,
            TransportLimit::Limited(seconds) => seconds,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, TransportLimit::Unlimited)
    }
}

// ---------------------------------------------------------------------------
// Loadout
// ---------------------------------------------------------------------------

/// Two items created together and combined, e.g. a diving suit with an
/// oxygen tank inside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadoutPair {
    pub container: String,
    pub contained: String,
}

impl LoadoutPair {
    pub fn new(container: impl Into<String>, contained: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            contained: contained.into(),
        }
    }
}

pub fn default_loadout() -> Vec<LoadoutPair> {
    vec![
        LoadoutPair::new("divingsuit", "oxygentank"),
        LoadoutPair::new("underwaterscooter", "batterycell"),
    ]
}

// ---------------------------------------------------------------------------
// Respawn config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    /// Seconds between dispatch opportunities once the countdown runs.
    pub respawn_interval: f32,
    /// Seconds budget for transport and for return. `< 0.1` disables the
    /// automatic return.
    pub max_transport_time: f32,
    /// Fraction of the population that must be eligible to start the countdown.
    pub min_respawn_ratio: f32,
    /// Items created for every revived character.
    pub loadout: Vec<LoadoutPair>,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            respawn_interval: 180.0,
            max_transport_time: 180.0,
            min_respawn_ratio: 0.2,
            loadout: default_loadout(),
        }
    }
}

impl RespawnConfig {
    pub fn new(respawn_interval: f32, max_transport_time: f32, min_respawn_ratio: f32) -> Self {
        Self {
            respawn_interval,
            max_transport_time,
            min_respawn_ratio,
            ..Default::default()
        }
    }

    pub fn transport_limit(&self) -> TransportLimit {
        TransportLimit::from_seconds(self.max_transport_time)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.respawn_interval > 0.0) {
            return Err(ConfigError::RespawnInterval(self.respawn_interval));
        }
        if !(self.max_transport_time >= 0.0) {
            return Err(ConfigError::MaxTransportTime(self.max_transport_time));
        }
        if !(0.0..=1.0).contains(&self.min_respawn_ratio) {
            return Err(ConfigError::MinRespawnRatio(self.min_respawn_ratio));
        }
        for (index, pair) in self.loadout.iter().enumerate() {
            if pair.container.is_empty() || pair.contained.is_empty() {
                return Err(ConfigError::EmptyLoadoutItem { index });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service settings (binary)
// ---------------------------------------------------------------------------

/// Everything the service binary reads from its config file / environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnSettings {
    /// Session name stamped on every outbound event.
    pub session: String,
    /// Simulation tick rate in Hz.
    pub tick_rate_hz: f32,
    pub respawn: RespawnConfig,
}

impl Default for RespawnSettings {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 30.0,
            respawn: RespawnConfig::default(),
        }
    }
}

/// Environment source for [`RespawnSettings::load`].
///
/// `RESPAWN_SESSION` sets `session`; nested keys use `__`, e.g.
/// `RESPAWN_RESPAWN__MAX_TRANSPORT_TIME`.
pub fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl RespawnSettings {
    /// Layer defaults, then the optional TOML file, then `env`.
    ///
    /// The result is not validated; callers apply their overrides first.
    pub fn load(
        file: Option<&Path>,
        env: ::config::Environment,
    ) -> Result<Self, ::config::ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path));
        }
        builder.add_source(env).build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz > 0.0) {
            return Err(ConfigError::TickRate(self.tick_rate_hz));
        }
        self.respawn.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_transport_time_means_unlimited() {
        assert_eq!(TransportLimit::from_seconds(0.0), TransportLimit::Unlimited);
        assert_eq!(TransportLimit::from_seconds(0.09), TransportLimit::Unlimited);
        assert_eq!(
            TransportLimit::from_seconds(0.1),
            TransportLimit::Limited(0.1)
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            RespawnConfig::new(0.0, 10.0, 0.5).validate(),
            Err(ConfigError::RespawnInterval(0.0))
        );
        assert_eq!(
            RespawnConfig::new(10.0, -1.0, 0.5).validate(),
            Err(ConfigError::MaxTransportTime(-1.0))
        );
        assert_eq!(
            RespawnConfig::new(10.0, 10.0, 1.5).validate(),
            Err(ConfigError::MinRespawnRatio(1.5))
        );
        assert!(RespawnConfig::new(10.0, 0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_loadout_item() {
        let mut config = RespawnConfig::default();
        config.loadout.push(LoadoutPair::new("", "batterycell"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyLoadoutItem { index: 2 })
        );
    }

    fn env_with(vars: &[(&str, &str)]) -> ::config::Environment {
        let map: ::config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn load_without_sources_gives_defaults() {
        let settings = RespawnSettings::load(None, env_with(&[])).unwrap();
        assert_eq!(settings.session, "default");
        assert_eq!(settings.tick_rate_hz, 30.0);
        assert_eq!(settings.respawn.respawn_interval, 180.0);
        assert_eq!(settings.respawn.loadout, default_loadout());
    }

    #[test]
    fn load_reads_single_underscore_prefix() {
        let settings = RespawnSettings::load(
            None,
            env_with(&[
                ("RESPAWN_SESSION", "reef"),
                ("RESPAWN_TICK_RATE_HZ", "60"),
                ("RESPAWN_RESPAWN__MAX_TRANSPORT_TIME", "0"),
                ("RESPAWN_RESPAWN__MIN_RESPAWN_RATIO", "0.5"),
                ("RESPAWN_PARTICIPANTS", "8"),
                ("OTHER_SESSION", "ignored"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.session, "reef");
        assert_eq!(settings.tick_rate_hz, 60.0);
        assert_eq!(settings.respawn.min_respawn_ratio, 0.5);
        assert!(settings.respawn.transport_limit().is_unlimited());
        assert_eq!(settings.respawn.respawn_interval, 180.0);
    }

    #[test]
    fn load_ignores_double_underscore_prefix() {
        let settings =
            RespawnSettings::load(None, env_with(&[("RESPAWN__SESSION", "wrong")])).unwrap();
        assert_eq!(settings.session, "default");
    }

    #[test]
    fn environment_overrides_file() {
        let path = std::env::temp_dir().join(format!(
            "shuttle-respawn-settings-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
session = "from-file"
tick_rate_hz = 20.0

[respawn]
respawn_interval = 90.0

[[respawn.loadout]]
container = "divingmask"
contained = "oxygentank"
"#,
        )
        .unwrap();

        let loaded = RespawnSettings::load(
            Some(&path),
            env_with(&[("RESPAWN_SESSION", "from-env")]),
        );
        std::fs::remove_file(&path).unwrap();
        let settings = loaded.unwrap();

        assert_eq!(settings.session, "from-env");
        assert_eq!(settings.tick_rate_hz, 20.0);
        assert_eq!(settings.respawn.respawn_interval, 90.0);
        assert_eq!(settings.respawn.max_transport_time, 180.0);
        assert_eq!(
            settings.respawn.loadout,
            [LoadoutPair::new("divingmask", "oxygentank")]
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn loaded_settings_still_validate() {
        let settings = RespawnSettings::load(
            None,
            env_with(&[("RESPAWN_RESPAWN__MIN_RESPAWN_RATIO", "2")]),
        )
        .unwrap();
        assert_eq!(
            settings.validate(),
            Err(ConfigError::MinRespawnRatio(2.0))
        );
    }
}
